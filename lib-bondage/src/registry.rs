//! Curve Registry
//!
//! Providers publish one curve per specifier. The bonding service only reads
//! curves through [`CurveRegistry`]; [`InMemoryCurveRegistry`] is the
//! in-process implementation used by nodes and tests.
//!
//! A curve may be replaced until the service locks it on its first bond.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use lib_types::{Address, Specifier};

use crate::curve::{CurveError, CurveSpec};
use crate::errors::{BondageError, BondageResult};

/// Read accessor consumed by the bonding service
pub trait CurveRegistry {
    fn is_provider_registered(&self, provider: &Address) -> bool;

    /// Active curve for the pair, if one was initiated
    fn curve(&self, provider: &Address, specifier: &Specifier) -> Option<CurveSpec>;

    /// Freeze the curve once dots have been issued against it
    fn lock_curve(&mut self, provider: &Address, specifier: &Specifier);
}

/// Provider metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub public_key: u64,
    pub title: String,
    /// Specifiers with a curve, in initiation order
    pub specifiers: Vec<Specifier>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CurveRecord {
    spec: CurveSpec,
    locked: bool,
}

/// In-memory curve registry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryCurveRegistry {
    providers: HashMap<Address, ProviderRecord>,
    curves: HashMap<(Address, Specifier), CurveRecord>,
}

impl InMemoryCurveRegistry {
    /// Create new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider
    pub fn initiate_provider(
        &mut self,
        provider: Address,
        public_key: u64,
        title: &str,
    ) -> BondageResult<()> {
        if self.providers.contains_key(&provider) {
            return Err(BondageError::ProviderAlreadyRegistered(provider));
        }
        if title.is_empty() {
            return Err(BondageError::InvalidParameters(
                "Provider title cannot be empty".to_string(),
            ));
        }

        self.providers.insert(
            provider,
            ProviderRecord {
                public_key,
                title: title.to_string(),
                specifiers: Vec::new(),
            },
        );
        tracing::info!("Registry: provider {:?} registered as '{}'", provider, title);
        Ok(())
    }

    /// Publish (or replace, while unlocked) the curve for `specifier`
    pub fn initiate_provider_curve(
        &mut self,
        provider: Address,
        specifier: Specifier,
        spec: CurveSpec,
    ) -> BondageResult<()> {
        let record = self
            .providers
            .get_mut(&provider)
            .ok_or(BondageError::ProviderUnregistered(provider))?;

        if !spec.is_initialized() {
            return Err(CurveError::InvalidCurve("cannot publish an empty curve".to_string()).into());
        }
        spec.curve_type.validate()?;
        if spec.max_dots == 0 {
            return Err(CurveError::InvalidCurve("curve ceiling must be positive".to_string()).into());
        }

        let key = (provider, specifier);
        if self.curves.get(&key).map(|c| c.locked).unwrap_or(false) {
            return Err(BondageError::CurveLocked { provider, specifier });
        }

        if !record.specifiers.contains(&specifier) {
            record.specifiers.push(specifier);
        }
        tracing::info!(
            "Registry: provider {:?} published {} curve for {:?}",
            provider,
            spec.curve_type,
            specifier
        );
        self.curves.insert(key, CurveRecord { spec, locked: false });
        Ok(())
    }

    /// Get provider by address
    pub fn provider(&self, provider: &Address) -> Option<&ProviderRecord> {
        self.providers.get(provider)
    }

    pub fn is_curve_locked(&self, provider: &Address, specifier: &Specifier) -> bool {
        self.curves
            .get(&(*provider, *specifier))
            .map(|c| c.locked)
            .unwrap_or(false)
    }

    /// Get registry statistics
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            total_providers: self.providers.len() as u64,
            total_curves: self.curves.len() as u64,
            locked_curves: self.curves.values().filter(|c| c.locked).count() as u64,
        }
    }
}

impl CurveRegistry for InMemoryCurveRegistry {
    fn is_provider_registered(&self, provider: &Address) -> bool {
        self.providers.contains_key(provider)
    }

    fn curve(&self, provider: &Address, specifier: &Specifier) -> Option<CurveSpec> {
        self.curves
            .get(&(*provider, *specifier))
            .map(|c| c.spec.clone())
    }

    fn lock_curve(&mut self, provider: &Address, specifier: &Specifier) {
        if let Some(record) = self.curves.get_mut(&(*provider, *specifier)) {
            if !record.locked {
                tracing::debug!("Registry: curve {:?}/{:?} locked", provider, specifier);
                record.locked = true;
            }
        }
    }
}

/// Registry statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total_providers: u64,
    pub total_curves: u64,
    pub locked_curves: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> Address {
        Address::new([2u8; 32])
    }

    fn specifier() -> Specifier {
        Specifier::from_name("test-specifier")
    }

    #[test]
    fn test_register_provider() {
        let mut registry = InMemoryCurveRegistry::new();
        registry.initiate_provider(provider(), 111, "test").unwrap();

        assert!(registry.is_provider_registered(&provider()));
        assert_eq!(registry.provider(&provider()).unwrap().public_key, 111);
        assert_eq!(registry.stats().total_providers, 1);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = InMemoryCurveRegistry::new();
        registry.initiate_provider(provider(), 111, "test").unwrap();

        assert_eq!(
            registry.initiate_provider(provider(), 111, "test"),
            Err(BondageError::ProviderAlreadyRegistered(provider()))
        );
    }

    #[test]
    fn test_gapped_piecewise_curve_rejected() {
        use crate::curve::{CurveType, Piece, PiecewiseTerm};

        let mut registry = InMemoryCurveRegistry::new();
        registry.initiate_provider(provider(), 111, "test").unwrap();

        let piece = |start, end| Piece {
            start,
            end,
            terms: vec![PiecewiseTerm { coefficient: 3, power: 0 }],
            divider: 1,
        };
        let gapped = CurveSpec::new(CurveType::Piecewise {
            pieces: vec![piece(1, 4), piece(6, 10)],
        });
        assert!(matches!(
            registry.initiate_provider_curve(provider(), specifier(), gapped),
            Err(BondageError::Curve(CurveError::InvalidCurve(_)))
        ));
        assert!(registry.curve(&provider(), &specifier()).is_none());
    }

    #[test]
    fn test_curve_requires_provider() {
        let mut registry = InMemoryCurveRegistry::new();
        let result = registry.initiate_provider_curve(provider(), specifier(), CurveSpec::linear(1, 2));
        assert_eq!(result, Err(BondageError::ProviderUnregistered(provider())));
        assert!(registry.curve(&provider(), &specifier()).is_none());
    }

    #[test]
    fn test_empty_curve_rejected() {
        let mut registry = InMemoryCurveRegistry::new();
        registry.initiate_provider(provider(), 111, "test").unwrap();

        let result = registry.initiate_provider_curve(provider(), specifier(), CurveSpec::uninitialized());
        assert!(matches!(result, Err(BondageError::Curve(CurveError::InvalidCurve(_)))));
    }

    #[test]
    fn test_reinitialize_until_locked() {
        let mut registry = InMemoryCurveRegistry::new();
        registry.initiate_provider(provider(), 111, "test").unwrap();
        registry
            .initiate_provider_curve(provider(), specifier(), CurveSpec::linear(1, 2))
            .unwrap();
        registry
            .initiate_provider_curve(provider(), specifier(), CurveSpec::linear(5, 5))
            .unwrap();
        assert_eq!(
            registry.curve(&provider(), &specifier()),
            Some(CurveSpec::linear(5, 5))
        );
        assert_eq!(registry.provider(&provider()).unwrap().specifiers.len(), 1);

        registry.lock_curve(&provider(), &specifier());
        assert!(registry.is_curve_locked(&provider(), &specifier()));
        assert_eq!(
            registry.initiate_provider_curve(provider(), specifier(), CurveSpec::linear(1, 2)),
            Err(BondageError::CurveLocked {
                provider: provider(),
                specifier: specifier(),
            })
        );
        assert_eq!(registry.stats().locked_curves, 1);
    }
}
