use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Source,
    Binary,
    Document,
    Translation,
    Other,
}

const SOURCE_EXTENSIONS: &[&str] = &[
    "c", "cc", "cpp", "cxx", "h", "hh", "hpp", "java", "py", "rb", "pl", "pm", "php", "cs", "go",
    "rs", "js", "jsx", "tsx", "scala", "kt", "m", "mm", "sh", "el", "lisp", "hs", "ml", "y", "l",
];

const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "tif", "tiff", "svgz", "o", "a", "so", "dll", "exe",
    "class", "jar", "zip", "gz", "tgz", "bz2", "xz", "tar", "mp3", "ogg", "wav", "ttf",
];

const DOCUMENT_EXTENSIONS: &[&str] = &[
    "txt", "md", "rst", "doc", "docx", "odt", "rtf", "tex", "pdf", "html", "htm", "sgml", "docbook",
    "man", "texi", "1",
];

const TRANSLATION_EXTENSIONS: &[&str] = &["po", "pot", "mo", "qm", "xlf", "xliff"];

/// Qt Linguist `.ts` files are told apart from TypeScript by the directory
/// they live in.
const TRANSLATION_DIRS: &[&str] = &["i18n", "l10n", "lang", "locale", "locales", "translations"];

const DOCUMENT_NAMES: &[&str] = &[
    "readme", "changelog", "changes", "news", "authors", "install", "copying", "todo", "license",
];

pub fn file_type(path: &str) -> FileType {
    let path = Path::new(path);
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let Some(extension) = extension else {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        return if DOCUMENT_NAMES.contains(&name.as_str()) {
            FileType::Document
        } else {
            FileType::Other
        };
    };

    let extension = extension.as_str();
    if extension == "ts" {
        return if in_translation_dir(path) {
            FileType::Translation
        } else {
            FileType::Source
        };
    }

    if SOURCE_EXTENSIONS.contains(&extension) {
        FileType::Source
    } else if TRANSLATION_EXTENSIONS.contains(&extension) {
        FileType::Translation
    } else if DOCUMENT_EXTENSIONS.contains(&extension) {
        FileType::Document
    } else if BINARY_EXTENSIONS.contains(&extension) {
        FileType::Binary
    } else {
        FileType::Other
    }
}

fn in_translation_dir(path: &Path) -> bool {
    path.parent().is_some_and(|parent| {
        parent.components().any(|c| {
            let name = c.as_os_str().to_string_lossy().to_ascii_lowercase();
            TRANSLATION_DIRS.contains(&name.as_str())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_extension() {
        assert_eq!(file_type("src/main.rs"), FileType::Source);
        assert_eq!(file_type("lib/Parser.JAVA"), FileType::Source);
        assert_eq!(file_type("icons/logo.png"), FileType::Binary);
        assert_eq!(file_type("docs/guide.md"), FileType::Document);
        assert_eq!(file_type("po/de.po"), FileType::Translation);
        assert_eq!(file_type("i18n/app_fr.ts"), FileType::Translation);
        assert_eq!(file_type("Cargo.lock"), FileType::Other);
    }

    #[test]
    fn ts_files_are_translations_only_in_translation_dirs() {
        assert_eq!(file_type("src/app.ts"), FileType::Source);
        assert_eq!(file_type("web/components/Form.TS"), FileType::Source);
        assert_eq!(file_type("translations/app_de.ts"), FileType::Translation);
        assert_eq!(file_type("gui/i18n/app_fr.ts"), FileType::Translation);
    }

    #[test]
    fn well_known_extensionless_files_are_documents() {
        assert_eq!(file_type("README"), FileType::Document);
        assert_eq!(file_type("pkg/ChangeLog"), FileType::Document);
        assert_eq!(file_type("Makefile"), FileType::Other);
    }
}
