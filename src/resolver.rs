//! Locale resolution: derive a canonical `language-REGION` locale from the
//! system locale, its raw identifier and the carrier region.
//!
//! Each candidate is tried in order and the fallback constants terminate the
//! chain, so every resolution yields non-empty values.

use std::fmt;
use std::sync::Arc;

use bevy::prelude::*;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::regions::{ IsoRegions, KnownRegionSet };
use crate::sources::{
    CarrierLocaleSource,
    EnvCarrierLocale,
    HostSystemLocale,
    SystemLocaleSource,
};
use crate::LocaleConfig;

/// Language used when no source provides one.
pub const DEFAULT_LANGUAGE: &str = "en";
/// Region used when no candidate passes validation. Never validated itself.
pub const DEFAULT_REGION: &str = "GB";

/// Read-only access to the resolved locale.
pub trait LocaleResolving {
    /// Lowercase language code, e.g. `"it"`.
    fn language_code(&self) -> String;

    /// Uppercase region code, e.g. `"CH"`.
    fn region_code(&self) -> String;

    /// `language_code() + "-" + region_code()`.
    ///
    /// Both halves are read independently, so a source changing in between
    /// may mix two snapshots. Use [`LocaleResolver::resolve`] for one pass.
    fn locale(&self) -> String {
        format!("{}-{}", self.language_code(), self.region_code())
    }
}

// ---------- Resolved value ----------

/// Result of one resolution pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Resource)]
pub struct ResolvedLocale {
    language: String,
    region: String,
    locale: String,
}

impl ResolvedLocale {
    fn new(language: String, region: String) -> Self {
        let locale = format!("{language}-{region}");
        Self { language, region, locale }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }
}

impl fmt::Display for ResolvedLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.locale)
    }
}

impl FromWorld for ResolvedLocale {
    fn from_world(world: &mut World) -> Self {
        match world.get_resource::<LocaleResolver>() {
            Some(resolver) => resolver.resolve(),
            None => {
                let config = world.get_resource::<LocaleConfig>().cloned().unwrap_or_default();
                LocaleResolver::from_config(&config).resolve()
            }
        }
    }
}

// ---------- Identifier components ----------

/// Language and region tokens of a raw identifier such as `"zh_Hant_HK"`.
///
/// Tokens longer than three characters are script tags (`Hant`, `Latn`) and
/// are dropped. At least two tokens must remain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawIdentifierComponents(Vec<String>);

impl RawIdentifierComponents {
    pub fn parse(identifier: &str) -> Option<Self> {
        if identifier.is_empty() {
            return None;
        }

        let tokens: Vec<String> = identifier
            .split('_')
            .filter(|token| token.chars().count() <= 3)
            .map(str::to_string)
            .collect();

        (tokens.len() >= 2).then_some(Self(tokens))
    }

    pub fn language(&self) -> &str {
        &self.0[0]
    }

    pub fn region(&self) -> &str {
        &self.0[self.0.len() - 1]
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }
}

// ---------- Region validation ----------

// Whitespace is accepted here; the known-region lookup rejects it.
static UPPERCASE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z\s]+$").unwrap());

/// Whether `candidate` is usable as a region code: non-empty, not numeric
/// (`"150"` is a UN M.49 area), uppercase only, and a known region.
pub fn is_valid_region(candidate: &str, known: &dyn KnownRegionSet) -> bool {
    !candidate.is_empty() &&
        candidate.parse::<i64>().is_err() &&
        UPPERCASE_RE.is_match(candidate) &&
        known.contains(candidate)
}

// ---------- Resolver ----------

/// Composes the system locale, its identifier and the carrier region into a
/// resolved locale.
///
/// # Example
///
/// ```rust
/// use bevy_locale::{ FixedCarrierLocale, FixedSystemLocale, LocaleResolver, LocaleResolving };
///
/// let resolver = LocaleResolver::with_sources(
///     FixedSystemLocale::new(Some("it"), None, "fr_FR"),
///     FixedCarrierLocale::new(Some("AT")),
/// );
/// assert_eq!(resolver.locale(), "it-FR");
/// ```
#[derive(Clone, Resource)]
pub struct LocaleResolver {
    system: Arc<dyn SystemLocaleSource>,
    carrier: Arc<dyn CarrierLocaleSource>,
    known_regions: Arc<dyn KnownRegionSet>,
    fallback_language: String,
    fallback_region: String,
}

impl LocaleResolver {
    pub fn new(
        system: Arc<dyn SystemLocaleSource>,
        carrier: Arc<dyn CarrierLocaleSource>,
        known_regions: Arc<dyn KnownRegionSet>
    ) -> Self {
        Self {
            system,
            carrier,
            known_regions,
            fallback_language: DEFAULT_LANGUAGE.to_string(),
            fallback_region: DEFAULT_REGION.to_string(),
        }
    }

    /// Resolver over the given sources and the bundled ISO region table.
    pub fn with_sources(
        system: impl SystemLocaleSource + 'static,
        carrier: impl CarrierLocaleSource + 'static
    ) -> Self {
        Self::new(Arc::new(system), Arc::new(carrier), Arc::new(IsoRegions))
    }

    /// Resolver over the host locale and the default carrier variable.
    pub fn host() -> Self {
        Self::with_sources(HostSystemLocale, EnvCarrierLocale::default())
    }

    pub fn from_config(config: &LocaleConfig) -> Self {
        Self::with_sources(
            HostSystemLocale,
            EnvCarrierLocale::new(config.carrier_region_env.clone())
        ).with_fallbacks(&config.default_language, &config.default_region)
    }

    /// Replaces the fallback constants. Empty values are ignored.
    pub fn with_fallbacks(mut self, language: &str, region: &str) -> Self {
        if !language.is_empty() {
            self.fallback_language = language.to_string();
        }
        if !region.is_empty() {
            self.fallback_region = region.to_string();
        }
        self
    }

    pub fn fallback_language(&self) -> &str {
        &self.fallback_language
    }

    pub fn fallback_region(&self) -> &str {
        &self.fallback_region
    }

    /// Resolves language and region once and composes the locale from them.
    pub fn resolve(&self) -> ResolvedLocale {
        let components = self.components();
        ResolvedLocale::new(
            self.resolve_language(components.as_ref()),
            self.resolve_region(components.as_ref())
        )
    }

    fn components(&self) -> Option<RawIdentifierComponents> {
        RawIdentifierComponents::parse(&self.system.identifier())
    }

    fn resolve_language(&self, components: Option<&RawIdentifierComponents>) -> String {
        self.system
            .language_code()
            .filter(|language| !language.is_empty())
            .or_else(|| {
                components
                    .map(|c| c.language())
                    .filter(|language| !language.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| self.fallback_language.clone())
    }

    fn resolve_region(&self, components: Option<&RawIdentifierComponents>) -> String {
        self.verified(self.system.region_code(), "system")
            .or_else(|| {
                self.verified(
                    components.map(|c| c.region().to_string()),
                    "identifier"
                )
            })
            .or_else(|| self.verified(self.carrier.region_code(), "carrier"))
            .unwrap_or_else(|| self.fallback_region.clone())
    }

    fn verified(&self, candidate: Option<String>, origin: &str) -> Option<String> {
        let candidate = candidate?;
        if is_valid_region(&candidate, self.known_regions.as_ref()) {
            Some(candidate)
        } else {
            trace!("Skipping {} region candidate '{}'", origin, candidate);
            None
        }
    }
}

impl LocaleResolving for LocaleResolver {
    fn language_code(&self) -> String {
        self.resolve_language(self.components().as_ref())
    }

    fn region_code(&self) -> String {
        self.resolve_region(self.components().as_ref())
    }
}

impl fmt::Debug for LocaleResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocaleResolver")
            .field("fallback_language", &self.fallback_language)
            .field("fallback_region", &self.fallback_region)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{ FixedCarrierLocale, FixedSystemLocale };

    fn resolver(
        language: Option<&str>,
        region: Option<&str>,
        identifier: &str,
        carrier: Option<&str>
    ) -> LocaleResolver {
        LocaleResolver::with_sources(
            FixedSystemLocale::new(language, region, identifier),
            FixedCarrierLocale::new(carrier)
        )
    }

    #[test]
    fn components_drop_script_tags() {
        let c = RawIdentifierComponents::parse("zh_Hant_HK").unwrap();
        assert_eq!(c.language(), "zh");
        assert_eq!(c.region(), "HK");
        assert_eq!(c.tokens().len(), 2);
    }

    #[test]
    fn components_need_two_tokens() {
        assert_eq!(RawIdentifierComponents::parse(""), None);
        assert_eq!(RawIdentifierComponents::parse("en"), None);
        assert_eq!(RawIdentifierComponents::parse("zh_Hant"), None);
        assert!(RawIdentifierComponents::parse("en_150").is_some());
    }

    #[test]
    fn region_validator_rules() {
        assert!(is_valid_region("GB", &IsoRegions));
        assert!(!is_valid_region("", &IsoRegions));
        assert!(!is_valid_region("150", &IsoRegions));
        assert!(!is_valid_region("us", &IsoRegions));
        assert!(!is_valid_region("Us", &IsoRegions));
        assert!(!is_valid_region("XX", &IsoRegions));
        assert!(!is_valid_region("A B", &IsoRegions));
    }

    #[test]
    fn whitespace_passes_casing_but_needs_membership() {
        let known: std::collections::HashSet<String> = ["A B".to_string()].into_iter().collect();
        assert!(is_valid_region("A B", &known));
        assert!(!is_valid_region("a b", &known));
    }

    #[test]
    fn language_prefers_system_then_identifier() {
        assert_eq!(resolver(Some("it"), None, "fr_FR", None).language_code(), "it");
        assert_eq!(resolver(None, None, "fr_FR", None).language_code(), "fr");
        assert_eq!(resolver(None, None, "zh_Hant_HK", None).language_code(), "zh");
        assert_eq!(resolver(None, None, "", None).language_code(), "en");
    }

    #[test]
    fn empty_language_candidates_are_skipped() {
        assert_eq!(resolver(Some(""), None, "fr_FR", None).language_code(), "fr");
        assert_eq!(resolver(None, None, "_FR", None).language_code(), "en");
        assert_eq!(resolver(None, None, "_FR", None).region_code(), "FR");
    }

    #[test]
    fn region_chain() {
        assert_eq!(resolver(None, Some("CH"), "fr_FR", Some("AT")).region_code(), "CH");
        assert_eq!(resolver(None, None, "fr_FR", Some("AT")).region_code(), "FR");
        assert_eq!(resolver(None, None, "", Some("AT")).region_code(), "AT");
        assert_eq!(resolver(None, None, "", None).region_code(), "GB");
        assert_eq!(resolver(None, None, "zh_Hant", None).region_code(), "GB");
    }

    #[test]
    fn carrier_is_validated_too() {
        assert_eq!(resolver(None, None, "", Some("at")).region_code(), "GB");
        assert_eq!(resolver(None, None, "", Some("XX")).region_code(), "GB");
    }

    #[test]
    fn custom_fallbacks_are_trusted() {
        let r = resolver(None, None, "", None).with_fallbacks("de", "ZZ");
        assert_eq!(r.locale(), "de-ZZ");

        let r = resolver(None, None, "", None).with_fallbacks("", "");
        assert_eq!(r.fallback_language(), DEFAULT_LANGUAGE);
        assert_eq!(r.fallback_region(), DEFAULT_REGION);
    }

    #[test]
    fn resolve_matches_trait_reads() {
        let r = resolver(Some("it"), Some("CH"), "fr_FR", Some("AT"));
        let resolved = r.resolve();
        assert_eq!(resolved.language(), "it");
        assert_eq!(resolved.region(), "CH");
        assert_eq!(resolved.locale(), r.locale());
        assert_eq!(resolved.to_string(), "it-CH");
    }
}
