//! Prompt template sent to the enclave model
//!
//! The enclave signs the templated text, not the raw user message, so this
//! template is part of the signed payload and must not drift.

const QUERY_PREFIX: &str = "Answer the following query in a valid formatted JSON object without comments with both the response and action fields deduced from the user's question. Adhere strictly to JSON syntax without comments. Query: ";
const QUERY_SUFFIX: &str = ". Response: { \"response\":";

/// Wrap a user message in the instruction template.
pub fn templated_query(message: &str) -> String {
    let mut prompt = String::with_capacity(QUERY_PREFIX.len() + message.len() + QUERY_SUFFIX.len());
    prompt.push_str(QUERY_PREFIX);
    prompt.push_str(message);
    prompt.push_str(QUERY_SUFFIX);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_text() {
        assert_eq!(
            templated_query("hello"),
            "Answer the following query in a valid formatted JSON object without comments with both the response and action fields deduced from the user's question. Adhere strictly to JSON syntax without comments. Query: hello. Response: { \"response\":"
        );
    }

    #[test]
    fn test_message_is_inserted_verbatim() {
        let prompt = templated_query("  {weird}  ");
        assert!(prompt.contains("Query:   {weird}  . Response:"));
    }
}
