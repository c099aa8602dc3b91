// SPDX-License-Identifier: MIT

//! Prompt templates shared by the workflows
//!
//! Placeholders are written `{name}` and filled with [`render`].

pub const QUERY_WRITER_INSTRUCTIONS: &str = "\
Your goal is to generate a targeted web search query. The query will gather information related to a specific topic.

<TOPIC>
{topic}
</TOPIC>

Return a JSON object with the field `query`.";

pub const SUMMARIZE_INSTRUCTIONS: &str = "\
Generate a high-quality summary of the web search results and keep it concise / related to the user topic.

<REQUIREMENTS>
When creating a NEW summary:
1. Highlight the most relevant information related to the user topic from the search results
2. Ensure a coherent flow of information

When EXTENDING an existing summary:
1. Read the existing summary and new search results carefully.
2. Compare the new information with the existing summary.
3. For each piece of new information:
    a. If it's related to existing points, integrate it into the relevant paragraph.
    b. If it's entirely new but relevant, add a new paragraph with a smooth transition.
    c. If it's not relevant to the user topic, skip it.
4. Ensure all additions are relevant to the user's topic.
5. Verify that your final output differs from the input summary.
</REQUIREMENTS>

<FORMATTING>
- Start directly with the updated summary, without preamble or titles. Do not use XML tags in the output.
</FORMATTING>";

pub const REFLECTION_INSTRUCTIONS: &str = "\
You are an expert research assistant analyzing a summary about {topic}.

<GOAL>
1. Identify knowledge gaps or areas that need deeper exploration
2. Generate a follow-up question that would help expand your understanding
3. Focus on technical details, implementation specifics, or emerging trends that weren't fully covered
</GOAL>

<REQUIREMENTS>
Ensure the follow-up question is self-contained and includes necessary context for web search.
</REQUIREMENTS>

Return a JSON object with the fields `knowledge_gap`, `follow_up_query` and `keep_searching`.

Provide your analysis:";

pub const API_TEST_PLAN_INSTRUCTIONS: &str = "\
You are an API test planner. Your task is to generate API request test plans based on the given API specification.

<REQUIREMENTS>
When planning an API request:
1. Carefully analyze the provided API specification.
2. Generate a structured test request plan that is valid and can be executed successfully.
3. Ensure the plan follows the API constraints (e.g., required parameters, request body format).
4. Consider multiple test scenarios, including normal cases, edge cases, and error cases.
5. Output the test plan as a JSON object with the fields `method`, `path`, `query_params`, `json_body` and `headers`.
</REQUIREMENTS>

<API_SPEC>
{api_spec}
</API_SPEC>";

pub const API_TEST_SUMMARY_INSTRUCTIONS: &str =
    "You are a summarizer. Your task is to summarize the results of an API request.";

pub const QUERY_OPTIMIZER_PREFIX: &str = "\
Refine the following question for better web search accuracy. Use the examples below as a reference. \
Only return the optimized question without additional explanations or modifications.";

/// Few-shot `(question, answer)` pairs for the query optimizer
pub const QUERY_OPTIMIZER_EXAMPLES: [(&str, &str); 6] = [
    (
        "Can you give me a short summary of k8s?",
        "Kubernetes (K8s) overview and key concepts summary",
    ),
    (
        "Tell me some simple exercises I can do at home",
        "Easy home workout routines",
    ),
    (
        "What is an efficient way to work remotely?",
        "Best practices for remote work productivity",
    ),
    (
        "How do I build an AI chatbot?",
        "How to build an AI chatbot: Tools and best practices",
    ),
    (
        "How can I make my website load faster?",
        "How to improve website loading speed: Optimization tips",
    ),
    (
        "Why is cybersecurity important?",
        "Why cybersecurity is crucial: Key threats and solutions",
    ),
];

pub const WEB_SUMMARY_INSTRUCTIONS: &str = "\
You are a professional summarizer. Your task is to summarize the text while maintaining key details and clarity.

<REQUIREMENTS>
When summarizing a text:
1. Carefully analyze the entire content of the provided web pages.
2. Ensure that no critical information is omitted while keeping the summary concise.
3. Structure the summary into two sections:
   - **Topic:** A brief sentence summarizing the main theme.
   - **Content:** Categorized key points organized logically.
4. If a page has a specific objective, such as providing guidance, making an argument, or presenting research findings, mention it explicitly.
5. The summary should be self-contained and include enough context so that readers can understand it without referring to the original source.
</REQUIREMENTS>

<OUTPUT_FORMAT>
## Topic
[Briefly summarize the main idea]

## Key concepts
- **[Category 1]**: Key points in a structured manner
- **[Category 2]**: Additional details, if necessary.

## Purpose / key message
- Key message to deliver to main goal

## Conclusion
- Summary of how to leverage this information
</OUTPUT_FORMAT>";

/// Replace each `{key}` in `template` with its value
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{}}}", key), value)
    })
}

/// Few-shot prompt asking for an optimized search query
pub fn query_optimizer_prompt(question: &str) -> String {
    let mut prompt = String::from(QUERY_OPTIMIZER_PREFIX);
    prompt.push_str("\n\n");
    for (q, a) in QUERY_OPTIMIZER_EXAMPLES {
        prompt.push_str(&format!("Question: {}\nAnswer: {}\n\n", q, a));
    }
    prompt.push_str(&format!("Question: {}", question));
    prompt
}
