// All LLM prompt constants for interview prep.
// Placeholders in `{braces}` are filled with `str::replace` before sending.

/// Role classification prompt. Replace `{job_description}`.
pub const ROLE_CLASSIFY_TEMPLATE: &str = r#"Analyze this job description and determine if it's a technical role (like software engineering, data science, IT) or a non-technical role (like marketing, sales, HR).

Job description:
{job_description}

Return ONLY a JSON object with this structure, with NO markdown formatting, NO code blocks, and NO additional text:
{
  "isTechnical": true,
  "roleCategory": "software engineering",
  "keySkills": ["skill1", "skill2", "skill3"]
}"#;

pub const WEBSITE_RESEARCH_SYSTEM: &str = "You are a thorough research assistant that explores \
    websites in detail to find specific information. You always provide concrete details and \
    examples, never generic statements.";

/// Website deep-dive query. Replace `{company_url}`.
pub const WEBSITE_RESEARCH_TEMPLATE: &str = r#"Visit the website {company_url} and explore it thoroughly. Find and report on:
1. Specific projects, case studies, or client work they showcase
2. Recent news, blog posts, or press releases (last 1-2 years)
3. Their products or services, with specific details
4. Technical information about their stack or methodologies

Include names of actual projects, clients, technologies, and initiatives. Check the blog, case studies, about page, and careers pages before saying anything is unavailable."#;

pub const COMPANY_RESEARCH_SYSTEM: &str = "You are a thorough research assistant that provides \
    detailed, specific information about companies based on the latest available information \
    online. You always provide concrete details and examples, never generic statements.";

/// General web search about the company. Replace `{domain}`.
pub const COMPANY_RESEARCH_TEMPLATE: &str = r#"Search the web for the company {domain}. Find and report on:
1. What they do: core business and mission
2. Their main products/services in detail
3. Company culture and values
4. Recent projects, news, or initiatives (last 1-2 years), with names and details
5. Technology stack they use
6. Market position and competitors

Include names of actual projects, clients, technologies, and initiatives."#;

pub const COMBINED_RESEARCH_SYSTEM: &str = "You are a thorough research assistant that explores \
    websites and online sources in detail to find specific information about companies. You \
    always provide concrete details and examples, never generic statements.";

/// Single simplified research query. Replace `{domain}` and `{company_url}`.
pub const COMBINED_RESEARCH_TEMPLATE: &str = r#"Research the company {domain} thoroughly. Visit their website {company_url} and search online for:
1. What they do: core business and mission
2. Their main products/services in detail
3. Company culture and values
4. Recent projects, news, or initiatives (last 1-2 years), with names and details
5. Technology stack they use
6. Market position and competitors

Include names of actual projects, clients, technologies, and initiatives you find."#;

/// Research without web access, used when Perplexity is unavailable. Replace `{company_url}`.
pub const OPENAI_RESEARCH_TEMPLATE: &str = r#"You are an expert researcher. Research information about the company with this website: {company_url}

Provide comprehensive information about:
1. What they do: core business and mission
2. Their main products/services in detail
3. Company culture and values
4. Recent projects or initiatives, with specific names and details
5. Technology stack they likely use
6. Market position and competitors"#;

/// Company notebook. Replace `{research}` and `{job_description}`.
pub const OVERVIEW_TEMPLATE: &str = r#"You are an expert career coach helping a candidate prepare for a job interview.

Here is detailed research about the company:
{research}

The candidate is applying for this role:
{job_description}

Create a personalized research notebook about this company based on the research. Cover what the company does, its products and services, culture and values, recent projects (use the exact names found in the research), technology stack, and market position.

Write it as personal notes, not a generic report. Add reminders like "Mention this in your interview" and tips connecting the candidate's experience to the company's values.

Format the response as HTML:
- <div class="tip">...</div> for tips and advice
- <div class="highlight">...</div> for important information
- <div class="note">...</div> for personal notes and reminders
- <div class="action">...</div> for actions to take before the interview
- headings, paragraphs, and bullet lists as appropriate"#;

/// Role strategy playbook. Replace `{role_kind}`, `{role_category}`, `{job_description}`.
pub const STRATEGY_TEMPLATE: &str = r#"You are creating an INTERVIEW PLAYBOOK for a job candidate: a practical, visual guide with specific actions.

Job description:
{job_description}

This is a {role_kind} role in the field of {role_category}.

Speak directly to the candidate ("you should..."). Structure the response as HTML with these sections:
1. <div class="skills-checklist"> the 4-5 most important skills, each in a <div class="skill-card"> with how to demonstrate it and what to prepare
2. <div class="talking-points"> 3-4 talking points connecting experience to the role's needs
3. <div class="interview-strategy"> DO and DON'T columns
4. <div class="likely-questions"> 3-4 likely questions with a short strategy each
5. <div class="your-advantage"> 2-3 ways to stand out

Be specific to this job description: call out skills it repeats and what its language signals."#;

/// Interview questions. Replace `{role_kind}`, `{role_category}`, `{question_focus}`,
/// `{company_url}`, `{job_description}`.
pub const QUESTIONS_TEMPLATE: &str = r#"You are an expert career coach helping a candidate prepare for a job interview.

Job description:
{job_description}

Company website: {company_url}

This is a {role_kind} role in the field of {role_category}.

Generate 5 likely interview questions for this role and provide strong sample answers.
{question_focus}

IMPORTANT: Return a JSON array with NO markdown formatting, NO code blocks, and NO additional text.
The response must start with [ and end with ] and be valid JSON:
[
  {
    "question": "Question text here",
    "answer": "Sample answer here",
    "tip": "Coaching tip on delivery",
    "interviewer_looking_for": "What the interviewer wants to hear"
  }
]"#;

pub const TECHNICAL_QUESTION_FOCUS: &str = "Include both technical and behavioral questions.";
pub const GENERAL_QUESTION_FOCUS: &str =
    "Focus on behavioral, situational, and role-specific questions.";
