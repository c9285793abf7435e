// Prompt constants for the tailoring call.

/// Tailoring prompt template. Replace `{resume}` and `{job}` before sending.
/// Both are embedded verbatim.
pub const TAILOR_PROMPT_TEMPLATE: &str = "
You are an expert resume writer. Please modify the following resume to better fit the job description using relevant keywords and experiences.

Resume:
{resume}

Job Description:
{job}

Return the improved resume in professional formatting (bullet points, spacing, etc).
";

pub fn build_tailor_prompt(resume: &str, job: &str) -> String {
    // `{job}` is substituted first so a resume containing the literal text
    // "{job}" is left untouched.
    TAILOR_PROMPT_TEMPLATE
        .replace("{job}", job)
        .replacen("{resume}", resume, 1)
}
