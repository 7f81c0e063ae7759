use symdex::config::SUPPORTED_LANGUAGES;
use symdex::indexer::parser::ExtractorRegistry;
use symdex::query::text::extensions_for;

pub fn list_languages() {
    let registry = ExtractorRegistry::with_defaults();

    println!("Indexed languages:");
    for language in SUPPORTED_LANGUAGES {
        let extensions = registry
            .for_language(language)
            .map(|e| e.extensions().iter().map(|ext| format!(".{}", ext)).collect::<Vec<_>>().join(", "))
            .unwrap_or_default();
        println!("  {:<12} {}", language, extensions);
    }

    println!("\nText search only (find --language):");
    for language in ["javascript", "typescript", "java"] {
        let extensions = extensions_for(language)
            .map(|exts| exts.iter().map(|ext| format!(".{}", ext)).collect::<Vec<_>>().join(", "))
            .unwrap_or_default();
        println!("  {:<12} {}", language, extensions);
    }
}
