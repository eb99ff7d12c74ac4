use crate::model::{Category, CommitType};

/// Extension rules, checked in order; the first rule listing the extension wins.
const CATEGORY_RULES: &[(Category, &[&str])] = &[
    (
        Category::Backend,
        &[
            "rs", "py", "go", "java", "kt", "kts", "scala", "rb", "php", "cs", "c", "h", "cc",
            "cpp", "hpp", "ex", "exs", "erl", "clj", "swift", "sh", "sql",
        ],
    ),
    (
        Category::Frontend,
        &[
            "js", "jsx", "ts", "tsx", "mjs", "cjs", "vue", "svelte", "html", "htm", "css", "scss",
            "sass", "less",
        ],
    ),
    (Category::Docs, &["md", "markdown", "mdx", "txt", "rst", "adoc"]),
    (
        Category::Config,
        &[
            "json", "yaml", "yml", "toml", "ini", "cfg", "conf", "xml", "env", "properties", "lock",
        ],
    ),
];

/// Lower-cased text after the last `.` of the final path segment.
pub fn extension(path: &str) -> Option<String> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    file_name
        .rfind('.')
        .map(|idx| file_name[idx + 1..].to_lowercase())
}

pub fn categorize(path: &str) -> Category {
    let Some(ext) = extension(path) else {
        return Category::Other;
    };
    CATEGORY_RULES
        .iter()
        .find(|(_, exts)| exts.contains(&ext.as_str()))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}

/// Conventional-commit type from a literal, case-insensitive `"<type>:"` prefix.
pub fn classify_type(message: &str) -> CommitType {
    let lowered = message.to_lowercase();
    CommitType::DECLARED
        .iter()
        .find(|t| {
            lowered
                .strip_prefix(t.as_str())
                .is_some_and(|rest| rest.starts_with(':'))
        })
        .copied()
        .unwrap_or(CommitType::Other)
}
