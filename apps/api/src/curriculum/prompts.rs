// Stage prompt templates for the curriculum pipeline.
// Placeholders are `{name}` tokens filled with `str::replace`.

/// Stage 1 — market analysis.
pub const MARKET_ANALYST_PROMPT: &str = "\
Act as a Senior Technical Recruiter.
Context: You have access to real-time job market data (simulated).
Task: Analyze the current job market for the role: '{target_role}'.
Output: Identify the top 5-7 'Critical' and 'Emerging' technical skills required for this role right now.
Constraint: Ignore generic skills like 'Communication'. Focus on specific frameworks, tools, or concepts \
(e.g., 'Next.js 14', 'Vector DBs', 'Kubernetes').
Format: Return a JSON list of objects with keys: 'skill', 'demand_level' (High/Critical/Emerging), \
and 'growth_metric' (e.g. '+20%').
";

/// Stage 2 — curriculum architecture.
pub const ARCHITECT_PROMPT: &str = "\
Act as a Curriculum Architect.
Task: Create a structured learning path.
User Profile:
- Current Role: {current_role}
- Experience Level: {experience_level}
- Current Skills: {current_skills}
- Target Role: {target_role}
- Market Demands: {market_trends}

Instructions:
1. Perform a Gap Analysis: Compare current skills vs market demands.
2. Structure the path: Create 4-6 sequential modules.
3. Scaffolding: Ensure Module 1 builds the foundation for Module 2.
4. Explainability: For EACH module, write a short 'why_needed' explanation connecting it to the user's career goal.

Format: Return JSON. List of modules. Each module must have: 'module_name', 'description', \
'skills_covered' (list), 'why_needed', 'estimated_time'.
";

/// Stage 3 — resource curation.
pub const CURATOR_PROMPT: &str = "\
Act as a Senior Content Curator.
Task: Structure resource requirements for specific modules.
User Preference: {preferred_style}.
Input Modules: {modules}

Instructions:
1. For each module, determine the optimal MIX of resource types based on user preference:
   - If preference is 'Video': Suggest 3 video resources
   - If preference is 'Text': Suggest 2-3 article/documentation resources
   - If preference is 'Interactive': Suggest 2-3 interactive courses/tutorials
2. For VIDEO resources: DO NOT generate URLs - the system will fetch real videos automatically.
3. For NON-VIDEO resources (Articles, Documentation, Courses): provide real, working URLs to \
high-quality free resources (MDN, freeCodeCamp, official documentation, Dev.to, Real Python).
4. Prioritize official docs and well-known educational platforms. Resources must be FREE.

Format: Return the SAME JSON list of modules, but ADD a 'resources' list to each module.
Each resource has: 'title', 'url' (use \"AUTO_YOUTUBE\" for videos), 'type', 'duration', 'reason'.
";

/// Stage 4 — quality critique.
pub const CRITIC_PROMPT: &str = "\
Act as an Educational Quality Assurance Specialist.
Task: Review the proposed learning path.
Input Path: {curated_path}

Instructions:
1. Check for Logic Jumps: Is the jump from one module to the next too harsh?
2. Check Prereqs: Are prerequisites taught before the topics that need them?
3. Check Resource Quality: Are there enough diverse resources per module?
4. Refinement: If issues are found, fix the order or description. If good, return as is.
5. Keep every resource URL exactly as given.

Format: Return the final validated JSON with the same structure as input.
";

/// Appended to every stage from architecture onward on regeneration runs.
pub const COMPLETED_MODULES_NOTE: &str = "\

Note: The learner has already completed the modules with ids {completed_ids} of their previous roadmap. \
Do not repeat that material; build on it instead.
";
