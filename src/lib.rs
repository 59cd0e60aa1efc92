#![doc = include_str!("../README.md")]

//! # bevy-locale
//!
//! Resolves the user's locale as a canonical `language-REGION` pair for
//! [Bevy](https://bevyengine.org/) apps:
//!
//! - **Layered sources**: system language and region, the raw system locale
//!   identifier, then the cellular carrier region
//! - **Region validation**: numeric areas (`150`), lowercase codes and unknown
//!   regions are skipped in favor of the next source
//! - **Total**: fallbacks (`en` / `GB`) guarantee a non-empty result
//! - **Injectable sources**: swap host sources for fixed values in tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bevy::prelude::*;
//! use bevy_locale::{ LocalePlugin, ResolvedLocale };
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(LocalePlugin::default())
//!         .add_systems(Startup, show_locale)
//!         .run();
//! }
//!
//! fn show_locale(locale: Res<ResolvedLocale>) {
//!     info!("language={} region={}", locale.language(), locale.region());
//! }
//! ```
//!
//! ## Resolution order
//!
//! Language: system language, first token of the system identifier, `en`.
//!
//! Region (each candidate validated): system region, last token of the
//! system identifier, carrier region, `GB`.

use std::path::Path;

use anyhow::{ Context, Result, bail };
use bevy::prelude::*;
use serde::{ Deserialize, Serialize };

mod regions;
mod resolver;
mod sources;

pub use regions::{ IsoRegions, KnownRegionSet };
pub use resolver::{
    DEFAULT_LANGUAGE,
    DEFAULT_REGION,
    LocaleResolver,
    LocaleResolving,
    RawIdentifierComponents,
    ResolvedLocale,
    is_valid_region,
};
pub use sources::{
    CarrierLocaleSource,
    DEFAULT_CARRIER_ENV,
    EnvCarrierLocale,
    FixedCarrierLocale,
    FixedSystemLocale,
    HostSystemLocale,
    NoCarrier,
    SystemLocaleSource,
};

/// Configuration for the locale plugin.
///
/// # Example
///
/// ```rust
/// use bevy_locale::LocaleConfig;
///
/// let config = LocaleConfig {
///     default_language: "de".to_string(),
///     default_region: "DE".to_string(),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct LocaleConfig {
    /// Language used when no source provides one.
    /// Default: "en"
    pub default_language: String,
    /// Region used when no candidate is valid. Not validated.
    /// Default: "GB"
    pub default_region: String,
    /// Environment variable holding the carrier country.
    /// Default: "CARRIER_REGION"
    pub carrier_region_env: String,
    /// Re-resolve every frame in `Update`.
    /// Default: false
    pub refresh_on_update: bool,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            default_language: DEFAULT_LANGUAGE.to_string(),
            default_region: DEFAULT_REGION.to_string(),
            carrier_region_env: DEFAULT_CARRIER_ENV.to_string(),
            refresh_on_update: false,
        }
    }
}

impl LocaleConfig {
    /// Parses a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("invalid locale config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs
            ::read_to_string(path)
            .with_context(|| format!("failed to read locale config '{}'", path.display()))?;
        Self::from_json_str(&content).with_context(|| format!("in '{}'", path.display()))
    }

    fn validate(&self) -> Result<()> {
        if self.default_language.is_empty() {
            bail!("default_language must not be empty");
        }
        if self.default_region.is_empty() {
            bail!("default_region must not be empty");
        }
        Ok(())
    }
}

// ---------- Bevy Plugin ----------

/// Resolves the locale at startup and exposes it as [`ResolvedLocale`].
///
/// Inserts [`LocaleConfig`], the [`LocaleResolver`] in use and the
/// [`ResolvedLocale`] resources.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use bevy_locale::{ FixedCarrierLocale, FixedSystemLocale, LocalePlugin, LocaleResolver, ResolvedLocale };
///
/// let mut app = App::new();
/// app.add_plugins(LocalePlugin::with_resolver(LocaleResolver::with_sources(
///     FixedSystemLocale::new(Some("it"), Some("CH"), "fr_FR"),
///     FixedCarrierLocale::new(Some("AT")),
/// )));
/// assert_eq!(app.world().resource::<ResolvedLocale>().locale(), "it-CH");
/// ```
#[derive(Default)]
pub struct LocalePlugin {
    pub config: LocaleConfig,
    resolver: Option<LocaleResolver>,
}

impl LocalePlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LocaleConfig) -> Self {
        Self { config, resolver: None }
    }

    /// Uses `resolver` as-is instead of the host sources.
    pub fn with_resolver(resolver: LocaleResolver) -> Self {
        Self { config: LocaleConfig::default(), resolver: Some(resolver) }
    }
}

impl Plugin for LocalePlugin {
    fn build(&self, app: &mut App) {
        if self.config.validate().is_err() {
            warn!("Empty fallback in locale config, using '{}-{}' where empty", DEFAULT_LANGUAGE, DEFAULT_REGION);
        }

        let resolver = self.resolver
            .clone()
            .unwrap_or_else(|| LocaleResolver::from_config(&self.config));

        app.insert_resource(self.config.clone())
            .insert_resource(resolver)
            .init_resource::<ResolvedLocale>();

        info!("Resolved locale '{}'", app.world().resource::<ResolvedLocale>());

        if self.config.refresh_on_update {
            app.add_systems(Update, refresh_resolved_locale);
        }
    }
}

/// Re-resolves the locale, touching [`ResolvedLocale`] only when it changed.
pub fn refresh_resolved_locale(resolver: Res<LocaleResolver>, mut resolved: ResMut<ResolvedLocale>) {
    let next = resolver.resolve();
    if *resolved != next {
        debug!("Locale changed from '{}' to '{}'", *resolved, next);
        *resolved = next;
    }
}

// ---------- API ----------

/// Extension trait for `App` to re-resolve the locale on demand.
pub trait LocaleAppExt {
    /// Re-resolves and stores the locale.
    ///
    /// Returns `None` and warns if no [`LocaleResolver`] is installed.
    fn refresh_locale(&mut self) -> Option<ResolvedLocale>;
}

impl LocaleAppExt for App {
    fn refresh_locale(&mut self) -> Option<ResolvedLocale> {
        let Some(resolver) = self.world().get_resource::<LocaleResolver>() else {
            warn!("No LocaleResolver installed, add LocalePlugin first");
            return None;
        };
        let next = resolver.resolve();

        match self.world_mut().get_resource_mut::<ResolvedLocale>() {
            Some(mut current) => {
                if *current != next {
                    debug!("Locale changed from '{}' to '{}'", *current, next);
                    *current = next.clone();
                }
            }
            None => {
                self.insert_resource(next.clone());
            }
        }

        Some(next)
    }
}
