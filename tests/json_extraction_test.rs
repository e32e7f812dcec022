#[cfg(test)]
mod tests {
    use crate::content::parse::{extract_tasks, remove_trailing_commas, MAX_TASKS};

    #[test]
    fn test_extract_tasks_from_code_block() {
        let text = r#"
        Here are your tasks.
        ```json
        ["Implement a stack", "Trace a push and pop"]
        ```
        Good luck.
        "#;

        let tasks = extract_tasks(text).unwrap();
        assert_eq!(tasks, vec!["Implement a stack", "Trace a push and pop"]);
    }

    #[test]
    fn test_extract_tasks_with_trailing_comma() {
        let tasks = extract_tasks(r#"["one", "two",]"#).unwrap();
        assert_eq!(tasks, vec!["one", "two"]);
    }

    #[test]
    fn test_extract_tasks_from_object() {
        let text = r#"Sure! {"tasks": ["Prove the lemma", "  "], "note": "x"}"#;
        let tasks = extract_tasks(text).unwrap();
        assert_eq!(tasks, vec!["Prove the lemma"]);
    }

    #[test]
    fn test_brackets_inside_strings() {
        let text = r#"["Index a[i] safely", "Explain ] in regex"]"#;
        let tasks = extract_tasks(text).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1], "Explain ] in regex");
    }

    #[test]
    fn test_bullet_list_fallback() {
        let text = "Try these:\n- Sort a list by hand\n2. Count comparisons\n* Compare with merge sort";
        let tasks = extract_tasks(text).unwrap();
        assert_eq!(
            tasks,
            vec!["Sort a list by hand", "Count comparisons", "Compare with merge sort"]
        );
    }

    #[test]
    fn test_task_count_is_capped() {
        let many: Vec<String> = (0..20).map(|i| format!("\"task {}\"", i)).collect();
        let text = format!("[{}]", many.join(","));
        assert_eq!(extract_tasks(&text).unwrap().len(), MAX_TASKS);
    }

    #[test]
    fn test_unusable_response_is_an_error() {
        assert!(extract_tasks("").is_err());
        assert!(extract_tasks("I cannot help with that.").is_err());
    }

    #[test]
    fn test_trailing_commas_inside_strings_are_kept() {
        assert_eq!(remove_trailing_commas(r#"["a,]", "b",]"#), r#"["a,]", "b"]"#);
    }
}
