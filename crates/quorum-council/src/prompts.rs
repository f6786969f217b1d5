use crate::{Stage1Response, Stage2Ranking};

/// Stage-2 peer-review prompt. The `FINAL RANKING:` epilogue format is a wire
/// contract: the ranking parser's primary path matches it literally.
pub(crate) fn build_ranking_prompt(user_query: &str, anonymized_responses: &str) -> String {
    format!(
        r#"You are evaluating different responses to the following question:

Question: {user_query}

Here are the responses from different models (anonymized):

{anonymized_responses}

Your task:
1. First, evaluate each response individually. For each response, explain what it does well and what it does poorly.
2. Then, at the very end of your response, provide a final ranking.

IMPORTANT: Your final ranking MUST be formatted EXACTLY as follows:
- Start with the line "FINAL RANKING:" (all caps, with colon)
- Then list the responses from best to worst as a numbered list
- Each line should be: number, period, space, then ONLY the response label (e.g., "1. Response A")
- Do not add any other text or explanations in the ranking section

Example of the correct format for your ENTIRE response:

Response A provides good detail on X but misses Y...
Response B is accurate but lacks depth on Z...
Response C offers the most comprehensive answer...

FINAL RANKING:
1. Response C
2. Response A
3. Response B

Now provide your evaluation and ranking:"#
    )
}

/// Stage-3 synthesis prompt. Identities are deliberately no longer anonymized
/// here; the chairman sees who said what and how peers ranked it.
pub(crate) fn build_chairman_prompt(
    user_query: &str,
    stage1_results: &[Stage1Response],
    stage2_results: &[Stage2Ranking],
) -> String {
    let mut stage1_text = String::new();
    for result in stage1_results {
        stage1_text.push_str(&format!(
            "Model: {}\nResponse: {}\n\n",
            result.model, result.response
        ));
    }

    let mut stage2_text = String::new();
    for result in stage2_results {
        stage2_text.push_str(&format!(
            "Model: {}\nRanking: {}\n\n",
            result.model, result.ranking
        ));
    }

    format!(
        r#"You are the Chairman of an LLM Council. Multiple AI models have provided responses to a user's question, and then ranked each other's responses.

Original Question: {user_query}

STAGE 1 - Individual Responses:
{stage1_text}

STAGE 2 - Peer Rankings:
{stage2_text}

Your task as Chairman is to synthesize all of this information into a single, comprehensive, accurate answer to the user's original question. Consider:
- The individual responses and their insights
- The peer rankings and what they reveal about response quality
- Any patterns of agreement or disagreement

Provide a clear, well-reasoned final answer that represents the council's collective wisdom:"#
    )
}

pub(crate) fn build_title_prompt(user_query: &str) -> String {
    format!(
        r#"Generate a very short title (3-5 words maximum) that summarizes the following question.
The title should be concise and descriptive. Do not use quotes or punctuation in the title.

Question: {user_query}

Title:"#
    )
}
