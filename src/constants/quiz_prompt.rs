pub const QUIZ_GENERATION_PROMPT: &str = "Output the JSON array directly. Do not include any reasoning, explanation or other text.

You are a professional quiz author and an experienced examiner checking how well an audience followed a lecture. Read the lecture content below and, based on its core ideas and implied meaning, write {count} single-choice questions, each with four options and exactly one correct answer. Prefer thought-provoking questions with a longer stem; you may quote news, biographies or books as material.

### Requirements:

1. Do not analyse; output the questions directly. Every question has one stem and four complete options (A, B, C, D) with exactly one correct answer.
2. Every option must have real content and must not be empty.
3. The correct answer must be exactly one of the letters A, B, C or D. Never use E, F or any other letter.
4. Cover different points of the lecture and avoid repeating question forms. Questions may extend beyond the surface of the text.
5. Write the questions in {language}. Keep them clear, rigorous and close to the lecture's key points.
6. The response must be a standard JSON array and nothing else: no explanation, no tags, no code fences.
7. Follow this format exactly and make sure every field has valid content:

[
  {
    \"question\": \"The question text?\",
    \"option_a\": \"Content of option A\",
    \"option_b\": \"Content of option B\",
    \"option_c\": \"Content of option C\",
    \"option_d\": \"Content of option D\",
    \"correct_option\": \"A\"
  }
]

### Notes:

- correct_option must be exactly one of A, B, C, D and must point at an option that exists.
- Produce all {count} questions.

Lecture content:
{content}
";

/// Fills the generation template for one batch.
pub fn build_quiz_prompt(content: &str, count: usize, language: &str) -> String {
    QUIZ_GENERATION_PROMPT
        .replace("{count}", &count.to_string())
        .replace("{language}", language)
        .replace("{content}", content)
}
