// Prompt templates for every LLM call the tool makes.
// Placeholders in braces are filled with `str::replace`.

/// Single-letter rating. The answer should be digits only, but judges rarely comply.
pub const RATE_PROMPT_TEMPLATE: &str = "Rate this CV on a scale of 1 to 100, \
    where 1 is the lowest chance and 100 is the highest chance. \
    Provide just number, don't provide any text.\n\n{cv}";

/// Pairwise comparison answered with "1" or "2".
pub const COMPARE_PROMPT_TEMPLATE: &str = "Compare these two CVs and choose which one has \
    a better chance of being invited for an interview.\n\n\
    CV 1:\n{cv_1}\n\nCV 2:\n{cv_2}\n\n\
    Return 1 for CV 1 and 2 for CV 2. Provide just number, don't provide a text.";

/// Pairwise comparison with both scores, answered in a labeled three-line layout.
pub const COMPARE_WITH_SCORES_PROMPT_TEMPLATE: &str = "Compare the following two CVs:\n\n\
    CV 1: {cv_1}\n\
    CV 2: {cv_2}\n\n\
    For each CV, provide a score between 1 and 100, where 1 is the lowest and 100 is the \
    highest chance of being invited for an interview.\n\n\
    Then, provide a winner: Return '1' if CV 1 is better, or '2' if CV 2 is better. \
    Respond in this format:\n\n\
    CV 1 Score: [numeric score]\n\
    CV 2 Score: [numeric score]\n\
    Winner: [1 or 2]";

/// Cover-letter body generation from `key=value` attribute lines.
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = "Generate a new cover letter. \
    Use these variables in the cover letter (use all of them and do not miss any): \n\
    {variables}\n\
    Do not use any other variables or information. Generate just the body of the letter - \
    do not include contact information, greetings, or anything not listed as variables \
    (excluding those from mentioned). Always, all variables ({keys}) must be included in \
    the cover letter.";

pub fn rate_prompt(cv: &str) -> String {
    RATE_PROMPT_TEMPLATE.replace("{cv}", cv)
}

pub fn compare_prompt(cv_1: &str, cv_2: &str) -> String {
    COMPARE_PROMPT_TEMPLATE
        .replace("{cv_1}", cv_1)
        .replace("{cv_2}", cv_2)
}

pub fn compare_with_scores_prompt(cv_1: &str, cv_2: &str) -> String {
    COMPARE_WITH_SCORES_PROMPT_TEMPLATE
        .replace("{cv_1}", cv_1)
        .replace("{cv_2}", cv_2)
}

/// Fills the cover-letter template with one `key=value` line per attribute.
pub fn cover_letter_prompt(attributes: &[(&str, &str)]) -> String {
    let variables: String = attributes
        .iter()
        .map(|(key, value)| format!("{key}={value}\n"))
        .collect();
    let keys = attributes
        .iter()
        .map(|(key, _)| *key)
        .collect::<Vec<_>>()
        .join(", ");
    COVER_LETTER_PROMPT_TEMPLATE
        .replace("{variables}", &variables)
        .replace("{keys}", &keys)
}
