//! File classification for change dispatch.
//!
//! The class decides which container-side side effect runs before the reload
//! broadcast: PHP source invalidates the opcache, template files flush the
//! template cache, stylesheets and scripts need the browser reload only.

use std::path::Path;

/// Change-dispatch class of a watched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    Php,
    Stylesheet,
    Script,
    Template,
    Other,
}

/// Classify a path by extension, falling back to template-name heuristics.
pub fn classify(path: &Path) -> FileClass {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "php" => return FileClass::Php,
        "css" | "scss" | "sass" | "less" => return FileClass::Stylesheet,
        "js" | "ts" | "jsx" | "tsx" => return FileClass::Script,
        _ => {}
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    if name.ends_with(".twig")
        || name.ends_with(".html")
        || name.starts_with("template-")
        || name.contains("template")
    {
        return FileClass::Template;
    }

    FileClass::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_extension() {
        assert_eq!(classify(Path::new("/t/functions.php")), FileClass::Php);
        assert_eq!(classify(Path::new("/t/style.CSS")), FileClass::Stylesheet);
        assert_eq!(classify(Path::new("/t/app.scss")), FileClass::Stylesheet);
        assert_eq!(classify(Path::new("/t/nav.js")), FileClass::Script);
        assert_eq!(classify(Path::new("/t/widget.tsx")), FileClass::Script);
    }

    #[test]
    fn classifies_templates_by_name() {
        assert_eq!(classify(Path::new("/t/header.twig")), FileClass::Template);
        assert_eq!(classify(Path::new("/t/index.html")), FileClass::Template);
        assert_eq!(
            classify(Path::new("/t/template-fullwidth.xyz")),
            FileClass::Template
        );
        assert_eq!(
            classify(Path::new("/t/page-template.cfg")),
            FileClass::Template
        );
    }

    #[test]
    fn extension_wins_over_template_name() {
        // template-home.php must clear the opcache, not the template cache.
        assert_eq!(classify(Path::new("/t/template-home.php")), FileClass::Php);
    }

    #[test]
    fn everything_else_is_other() {
        assert_eq!(classify(Path::new("/t/readme.md")), FileClass::Other);
        assert_eq!(classify(Path::new("/t/photo.png")), FileClass::Other);
        assert_eq!(classify(Path::new("/t/Makefile")), FileClass::Other);
    }
}
