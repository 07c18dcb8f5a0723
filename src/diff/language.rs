//! Language detection from file paths.

use std::path::Path;

use tracing::trace;

/// Coarse category of a detected language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageCategory {
    /// Program source (counts as "code" for classification).
    Source,
    /// Markup, styles and templates.
    Markup,
    /// Data and configuration formats.
    Data,
    /// Prose documentation.
    Docs,
    /// Build system and tooling files.
    Build,
}

/// Detect the language of `path`, first by well-known file name, then by
/// extension. Returns `None` for unknown files.
pub fn detect_language(path: &str) -> Option<&'static str> {
    let detected = lookup(path).map(|(name, _)| name);
    trace!(path, language = ?detected, "Detected language");
    detected
}

/// Category of the language detected for `path`.
pub fn language_category(path: &str) -> Option<LanguageCategory> {
    lookup(path).map(|(_, category)| category)
}

fn lookup(path: &str) -> Option<(&'static str, LanguageCategory)> {
    let file_name = Path::new(path).file_name()?.to_str()?;
    if let Some(found) = by_file_name(file_name) {
        return Some(found);
    }
    let extension = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    by_extension(&extension)
}

fn by_file_name(name: &str) -> Option<(&'static str, LanguageCategory)> {
    use LanguageCategory::*;

    let found = match name {
        "Dockerfile" => ("Dockerfile", Build),
        "Makefile" | "makefile" | "GNUmakefile" => ("Makefile", Build),
        "CMakeLists.txt" => ("CMake", Build),
        ".gitignore" => ("GitIgnore", Data),
        ".dockerignore" => ("DockerIgnore", Data),
        ".env" => ("Environment Variables", Data),
        "package.json" => ("npm Package", Build),
        "requirements.txt" => ("Python Requirements", Build),
        "go.mod" => ("Go Module", Build),
        "build.gradle" => ("Gradle", Build),
        "pom.xml" => ("Maven POM", Build),
        "Gemfile" => ("Ruby Gemfile", Build),
        "Cargo.toml" => ("Rust Cargo", Build),
        _ => return None,
    };
    Some(found)
}

fn by_extension(extension: &str) -> Option<(&'static str, LanguageCategory)> {
    use LanguageCategory::*;

    let found = match extension {
        "py" => ("Python", Source),
        "js" | "mjs" | "cjs" => ("JavaScript", Source),
        "jsx" => ("JavaScript (React)", Source),
        "ts" => ("TypeScript", Source),
        "tsx" => ("TypeScript (React)", Source),
        "java" => ("Java", Source),
        "c" => ("C", Source),
        "cpp" | "cc" | "cxx" => ("C++", Source),
        "h" => ("C/C++ Header", Source),
        "hpp" => ("C++ Header", Source),
        "cs" => ("C#", Source),
        "go" => ("Go", Source),
        "rb" => ("Ruby", Source),
        "php" => ("PHP", Source),
        "swift" => ("Swift", Source),
        "kt" => ("Kotlin", Source),
        "rs" => ("Rust", Source),
        "scala" => ("Scala", Source),
        "m" => ("Objective-C", Source),
        "mm" => ("Objective-C++", Source),
        "vue" => ("Vue", Source),
        "svelte" => ("Svelte", Source),
        "sh" => ("Shell", Source),
        "bash" => ("Bash", Source),
        "zsh" => ("Zsh", Source),
        "bat" => ("Batch", Source),
        "ps1" => ("PowerShell", Source),
        "sql" => ("SQL", Source),
        "graphql" => ("GraphQL", Source),
        "r" => ("R", Source),
        "dart" => ("Dart", Source),
        "lua" => ("Lua", Source),
        "pl" => ("Perl", Source),
        "pm" => ("Perl Module", Source),
        "ex" => ("Elixir", Source),
        "exs" => ("Elixir Script", Source),
        "elm" => ("Elm", Source),
        "erl" => ("Erlang", Source),
        "clj" => ("Clojure", Source),
        "fs" => ("F#", Source),
        "hs" => ("Haskell", Source),
        "sol" => ("Solidity", Source),
        "html" | "htm" => ("HTML", Markup),
        "css" => ("CSS", Markup),
        "scss" => ("SCSS", Markup),
        "sass" => ("Sass", Markup),
        "less" => ("Less", Markup),
        "json" => ("JSON", Data),
        "xml" => ("XML", Data),
        "yaml" | "yml" => ("YAML", Data),
        "toml" => ("TOML", Data),
        "ini" => ("INI", Data),
        "csv" => ("CSV", Data),
        "tsv" => ("TSV", Data),
        "proto" => ("Protocol Buffers", Data),
        "md" | "markdown" => ("Markdown", Docs),
        "rst" => ("reStructuredText", Docs),
        "adoc" => ("AsciiDoc", Docs),
        "tex" => ("LaTeX", Docs),
        "txt" => ("Text", Docs),
        "dockerfile" => ("Dockerfile", Build),
        "cmake" => ("CMake", Build),
        "tf" => ("Terraform", Build),
        _ => return None,
    };
    Some(found)
}
