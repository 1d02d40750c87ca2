use anyhow::{Context, Result};
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource};
use log::{debug, warn};
use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, OnceLock};
use unic_langid::LanguageIdentifier;

/// Languages with a message bundle
pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "bn"];
pub const FALLBACK_LANGUAGE: &str = "en";

// Shipped copies, used when ./locales is not next to the binary
const EMBEDDED_EN: &str = include_str!("../locales/en/main.ftl");
const EMBEDDED_BN: &str = include_str!("../locales/bn/main.ftl");

/// Localization manager for the bot's reply templates
#[derive(Default)]
pub struct LocalizationManager {
    bundles: HashMap<String, Arc<FluentBundle<FluentResource>>>,
}

impl LocalizationManager {
    /// Create a new localization manager with every supported language loaded
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();

        for lang in SUPPORTED_LANGUAGES {
            let locale: LanguageIdentifier = lang
                .parse()
                .with_context(|| format!("Invalid language identifier: {lang}"))?;
            let bundle = Self::create_bundle(&locale)?;
            bundles.insert(lang.to_string(), Arc::new(bundle));
        }

        Ok(Self { bundles })
    }

    /// Create a fluent bundle for a specific locale
    fn create_bundle(locale: &LanguageIdentifier) -> Result<FluentBundle<FluentResource>> {
        let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);
        // Isolation marks would end up verbatim in chat messages
        bundle.set_use_isolating(false);

        let resource_path = format!("./locales/{locale}/main.ftl");
        let content = match fs::read_to_string(&resource_path) {
            Ok(content) => content,
            Err(_) => {
                debug!("No {resource_path} on disk, using embedded messages");
                Self::embedded_resource(&locale.to_string()).to_string()
            }
        };

        let resource = FluentResource::try_new(content).map_err(|(resource, errors)| {
            warn!("Parse errors in {resource_path}: {errors:?}");
            resource
        });
        // A partially parsed resource still carries every valid message
        let resource = resource.unwrap_or_else(|partial| partial);

        if let Err(errors) = bundle.add_resource(resource) {
            warn!("Duplicate messages in {resource_path}: {errors:?}");
        }

        Ok(bundle)
    }

    fn embedded_resource(language: &str) -> &'static str {
        match language {
            "bn" => EMBEDDED_BN,
            _ => EMBEDDED_EN,
        }
    }

    /// Get a localized message in a specific language, falling back to English
    pub fn get_message_in_language(
        &self,
        key: &str,
        language: &str,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        let bundle = match self
            .bundles
            .get(language)
            .or_else(|| self.bundles.get(FALLBACK_LANGUAGE))
        {
            Some(bundle) => bundle,
            None => return format!("Missing translation: {key}"),
        };

        let msg = match bundle.get_message(key) {
            Some(msg) => msg,
            None if language != FALLBACK_LANGUAGE => {
                return self.get_message_in_language(key, FALLBACK_LANGUAGE, args)
            }
            None => return format!("Missing translation: {key}"),
        };

        let pattern = match msg.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {key}"),
        };

        let fluent_args = args.map(|args| {
            let mut fluent_args = FluentArgs::new();
            for (name, value) in args {
                fluent_args.set(*name, value.to_string());
            }
            fluent_args
        });

        let mut value = String::new();
        let mut errors = vec![];
        if let Err(e) = bundle.write_pattern(&mut value, pattern, fluent_args.as_ref(), &mut errors) {
            warn!("Failed to format message {key}: {e}");
        }
        if !errors.is_empty() {
            debug!("Formatting {key} reported {errors:?}");
        }

        value
    }

    /// Whether the language's own bundle defines the key (no fallback)
    pub fn has_message(&self, key: &str, language: &str) -> bool {
        self.bundles
            .get(language)
            .map(|bundle| bundle.has_message(key))
            .unwrap_or(false)
    }

    /// Get a localized message with simple string arguments
    pub fn get_message_with_args(&self, key: &str, args: &[(&str, &str)], language: &str) -> String {
        let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
        self.get_message_in_language(key, language, Some(&args_map))
    }
}

/// Global localization instance
static LOCALIZATION_MANAGER: OnceLock<LocalizationManager> = OnceLock::new();

/// Initialize the global localization manager
pub fn init_localization() -> Result<()> {
    if LOCALIZATION_MANAGER.get().is_none() {
        let manager = LocalizationManager::new()?;
        // Another thread may have won the race, which is fine
        let _ = LOCALIZATION_MANAGER.set(manager);
    }
    Ok(())
}

/// Get the global localization manager, loading it on first use
pub fn get_localization_manager() -> &'static LocalizationManager {
    LOCALIZATION_MANAGER.get_or_init(|| {
        LocalizationManager::new().unwrap_or_else(|e| {
            warn!("Localization unavailable: {e:#}");
            LocalizationManager::default()
        })
    })
}

/// Map a client language code to a supported language
///
/// `bn-BD` -> `bn`, `en-US` -> `en`, anything unknown -> `en`.
pub fn detect_language(language_code: Option<&str>) -> &'static str {
    let primary = language_code
        .map(|code| {
            code.split(['-', '_'])
                .next()
                .unwrap_or_default()
                .to_lowercase()
        })
        .unwrap_or_default();

    SUPPORTED_LANGUAGES
        .iter()
        .copied()
        .find(|lang| *lang == primary)
        .unwrap_or(FALLBACK_LANGUAGE)
}

/// Whether the text contains Bengali script
pub fn contains_bengali(text: &str) -> bool {
    text.chars().any(|c| ('\u{0980}'..='\u{09FF}').contains(&c))
}

/// Pick the reply language from the message text and the client language code
///
/// Text written in Bengali script wins over the client setting.
pub fn language_for(text: Option<&str>, language_code: Option<&str>) -> &'static str {
    if text.map(contains_bengali).unwrap_or(false) {
        "bn"
    } else {
        detect_language(language_code)
    }
}

/// Convenience function to get a localized message in a language
pub fn t_lang(key: &str, language: &str) -> String {
    get_localization_manager().get_message_in_language(key, language, None)
}

/// Localized message only when the language defines the key itself
pub fn t_opt_lang(key: &str, language: &str) -> Option<String> {
    let manager = get_localization_manager();
    manager
        .has_message(key, language)
        .then(|| manager.get_message_in_language(key, language, None))
}

/// Convenience function to get a localized message with arguments
pub fn t_args_lang(key: &str, args: &[(&str, &str)], language: &str) -> String {
    get_localization_manager().get_message_with_args(key, args, language)
}
