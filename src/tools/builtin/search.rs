fn synthetic_results(query: &str) -> [String; 3] {
    [
        format!("Search result 1 for '{query}': Recent information about {query}"),
        format!("Search result 2 for '{query}': Latest news and updates on {query}"),
        format!("Search result 3 for '{query}': Comprehensive guide to {query}"),
    ]
}

/// Returns up to `num_results` synthetic results, numbered from 1.
pub fn search_web(query: &str, num_results: usize) -> String {
    let lines = synthetic_results(query)
        .into_iter()
        .take(num_results)
        .enumerate()
        .map(|(idx, result)| format!("{}. {result}", idx + 1))
        .collect::<Vec<_>>();
    format!("Web search results for '{query}':\n{}", lines.join("\n"))
}
