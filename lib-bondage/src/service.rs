//! Bonding Service
//!
//! Orchestrates bond, unbond, delegated bonding, escrow and release against
//! the curve evaluator, the dot ledger and the delegation table. Curves come
//! from a [`CurveRegistry`]; tokens move through a [`TokenCollaborator`].
//!
//! # Atomicity
//!
//! Every operation validates and prices first, prepares its ledger update,
//! then moves tokens, and only commits the ledger once the token call has
//! succeeded. A rejected transfer leaves no trace in the ledger.

use lib_types::{Address, Amount, DotCount, Specifier};

use crate::authority::AuthorityContext;
use crate::config::BondageConfig;
use crate::curve::{dots_for_tokens, refund_for_dots, tokens_for_dots, BondQuote, CurveSpec};
use crate::delegation::DelegationTable;
use crate::errors::{BondageError, BondageResult};
use crate::ledger::{BondKey, BondingLedger, CurveKey};
use crate::registry::CurveRegistry;
use crate::token::TokenCollaborator;

/// The bonding engine: sole writer of dot balances, escrow and issuance
#[derive(Debug, Clone)]
pub struct BondingService<R: CurveRegistry, T: TokenCollaborator> {
    config: BondageConfig,
    authority: AuthorityContext,
    registry: R,
    token: T,
    ledger: BondingLedger,
    delegations: DelegationTable,
}

impl<R: CurveRegistry, T: TokenCollaborator> BondingService<R, T> {
    pub fn new(config: BondageConfig, registry: R, token: T) -> BondageResult<Self> {
        config.validate()?;
        let authority = AuthorityContext::new(config.owner, config.arbiter);
        tracing::info!(
            "Bonding service started: service account {}, curve cap {} dots",
            config.service_address,
            config.max_dots_per_curve
        );
        Ok(Self {
            config,
            authority,
            registry,
            token,
            ledger: BondingLedger::new(),
            delegations: DelegationTable::new(),
        })
    }

    pub fn config(&self) -> &BondageConfig {
        &self.config
    }

    pub fn authority(&self) -> &AuthorityContext {
        &self.authority
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    pub fn token(&self) -> &T {
        &self.token
    }

    pub fn token_mut(&mut self) -> &mut T {
        &mut self.token
    }

    pub fn ledger(&self) -> &BondingLedger {
        &self.ledger
    }

    pub fn delegations(&self) -> &DelegationTable {
        &self.delegations
    }

    // =========================================================================
    // Curve lookup
    // =========================================================================

    /// Curve as published, failing when the provider or curve is missing
    fn active_curve(&self, provider: &Address, specifier: &Specifier) -> BondageResult<CurveSpec> {
        if !self.registry.is_provider_registered(provider) {
            return Err(BondageError::ProviderUnregistered(*provider));
        }
        match self.registry.curve(provider, specifier) {
            Some(spec) if spec.is_initialized() => Ok(spec),
            _ => Err(BondageError::CurveUninitialized {
                provider: *provider,
                specifier: *specifier,
            }),
        }
    }

    /// Curve with the service-wide issuance cap applied
    fn bonding_curve(&self, provider: &Address, specifier: &Specifier) -> BondageResult<CurveSpec> {
        let spec = self.active_curve(provider, specifier)?;
        let max_dots = spec.max_dots.min(self.config.max_dots_per_curve);
        Ok(spec.with_max_dots(max_dots))
    }

    // =========================================================================
    // Bond / unbond
    // =========================================================================

    fn execute_bond(
        &mut self,
        payer: Address,
        holder: Address,
        provider: Address,
        specifier: Specifier,
        tokens: Amount,
    ) -> BondageResult<BondQuote> {
        let spec = self.bonding_curve(&provider, &specifier)?;
        let key = BondKey::new(holder, provider, specifier);
        let issued = self.ledger.dots_issued(&key.curve());

        let quote = dots_for_tokens(&spec, issued, tokens)?;
        if quote.dots == 0 {
            tracing::debug!(
                "Bond: {} tokens from {} buy no dots on {}/{} (issued {})",
                tokens,
                payer,
                provider,
                specifier,
                issued
            );
            return Ok(BondQuote::ZERO);
        }

        let update = self.ledger.prepare_credit(&key, quote.dots)?;
        if quote.tokens > 0 {
            self.token
                .transfer_from(self.config.service_address, payer, quote.tokens)?;
        }
        self.ledger.commit(update);
        self.registry.lock_curve(&provider, &specifier);

        tracing::info!(
            "Bond: {} dots to {} on {}/{} for {} tokens from {} (issued now {})",
            quote.dots,
            holder,
            provider,
            specifier,
            quote.tokens,
            payer,
            update.issued_after()
        );
        Ok(quote)
    }

    fn execute_unbond(
        &mut self,
        holder: Address,
        provider: Address,
        specifier: Specifier,
        dots: DotCount,
    ) -> BondageResult<Amount> {
        let spec = self.active_curve(&provider, &specifier)?;
        if dots == 0 {
            return Ok(0);
        }

        let key = BondKey::new(holder, provider, specifier);
        let issued = self.ledger.dots_issued(&key.curve());
        let update = self.ledger.prepare_debit(&key, dots)?;
        let refund = refund_for_dots(&spec, issued, dots)?;

        if refund > 0 {
            self.token
                .transfer(self.config.service_address, holder, refund)?;
        }
        self.ledger.commit(update);

        tracing::info!(
            "Unbond: {} dots of {} on {}/{} refunded {} tokens (issued now {})",
            dots,
            holder,
            provider,
            specifier,
            refund,
            update.issued_after()
        );
        Ok(refund)
    }

    /// Spend up to `tokens` of the subscriber's allowance on dots
    pub fn bond(
        &mut self,
        subscriber: Address,
        provider: Address,
        specifier: Specifier,
        tokens: Amount,
    ) -> BondageResult<BondQuote> {
        self.execute_bond(subscriber, subscriber, provider, specifier, tokens)
    }

    /// Return `dots` to the curve and refund their value to the subscriber
    pub fn unbond(
        &mut self,
        subscriber: Address,
        provider: Address,
        specifier: Specifier,
        dots: DotCount,
    ) -> BondageResult<Amount> {
        self.execute_unbond(subscriber, provider, specifier, dots)
    }

    // =========================================================================
    // Delegation
    // =========================================================================

    /// Bond with the delegate's tokens, crediting the subscriber.
    /// One delegated bond per (subscriber, provider) until reset.
    pub fn delegate_bond(
        &mut self,
        delegate: Address,
        subscriber: Address,
        provider: Address,
        specifier: Specifier,
        tokens: Amount,
    ) -> BondageResult<BondQuote> {
        self.delegations.ensure_can_bond(&subscriber, &provider)?;
        let quote = self.execute_bond(delegate, subscriber, provider, specifier, tokens)?;
        self.delegations.record_bond(delegate, subscriber, provider)?;
        tracing::info!(
            "Delegation: {} is now delegate of {} for provider {}",
            delegate,
            subscriber,
            provider
        );
        Ok(quote)
    }

    /// Unbond the subscriber's dots as its active delegate. The refund goes
    /// to the subscriber.
    pub fn delegate_unbond(
        &mut self,
        delegate: Address,
        subscriber: Address,
        provider: Address,
        specifier: Specifier,
        dots: DotCount,
    ) -> BondageResult<Amount> {
        self.delegations
            .authorize_unbond(&delegate, &subscriber, &provider)?;
        self.execute_unbond(subscriber, provider, specifier, dots)
    }

    /// Clear the subscriber's delegation for `provider`
    pub fn reset_delegate(
        &mut self,
        caller: Address,
        subscriber: Address,
        provider: Address,
    ) -> BondageResult<()> {
        if caller != subscriber {
            tracing::warn!("Delegation: {} tried to reset delegate of {}", caller, subscriber);
            return Err(BondageError::Unauthorized(format!(
                "only subscriber {} may reset its delegate",
                subscriber
            )));
        }
        if let Some(delegate) = self.delegations.reset(&subscriber, &provider) {
            tracing::info!(
                "Delegation: {} removed delegate {} for provider {}",
                subscriber,
                delegate,
                provider
            );
        }
        Ok(())
    }

    // =========================================================================
    // Escrow (arbiter only)
    // =========================================================================

    fn require_arbiter(&self, operator: &Address) -> BondageResult<()> {
        self.authority.require_arbiter(operator).map_err(|e| {
            tracing::warn!("Escrow: rejected operator {}: {}", operator, e);
            e
        })
    }

    /// Move bound dots into escrow. Returns 0 without error when the
    /// subscriber holds fewer than `dots`.
    pub fn escrow_dots(
        &mut self,
        operator: Address,
        subscriber: Address,
        provider: Address,
        specifier: Specifier,
        dots: DotCount,
    ) -> BondageResult<DotCount> {
        self.require_arbiter(&operator)?;
        let key = BondKey::new(subscriber, provider, specifier);
        let moved = self.ledger.escrow(&key, dots);
        if moved == 0 && dots > 0 {
            tracing::warn!(
                "Escrow: {} holds {} dots on {}/{}, cannot escrow {}",
                subscriber,
                self.ledger.bound_dots(&key),
                provider,
                specifier,
                dots
            );
        } else {
            tracing::info!("Escrow: {} dots of {} held", moved, subscriber);
        }
        Ok(moved)
    }

    /// Pay escrowed dots to `target`, clamped to the escrow balance
    pub fn release_dots(
        &mut self,
        operator: Address,
        subscriber: Address,
        provider: Address,
        specifier: Specifier,
        target: Address,
        dots: DotCount,
    ) -> BondageResult<DotCount> {
        self.require_arbiter(&operator)?;
        let key = BondKey::new(subscriber, provider, specifier);
        let released = self.ledger.release(&key, target, dots)?;
        tracing::info!(
            "Escrow: released {} of {} requested dots from {} to {}",
            released,
            dots,
            subscriber,
            target
        );
        Ok(released)
    }

    /// Cancel escrow back to the subscriber, clamped to the escrow balance
    pub fn return_dots(
        &mut self,
        operator: Address,
        subscriber: Address,
        provider: Address,
        specifier: Specifier,
        dots: DotCount,
    ) -> BondageResult<DotCount> {
        self.require_arbiter(&operator)?;
        let key = BondKey::new(subscriber, provider, specifier);
        let returned = self.ledger.release(&key, subscriber, dots)?;
        tracing::info!("Escrow: returned {} dots to {}", returned, subscriber);
        Ok(returned)
    }

    // =========================================================================
    // Pricing
    // =========================================================================

    /// Tokens needed for the next `dots` at current issuance
    pub fn calc_zap_for_dots(
        &self,
        provider: Address,
        specifier: Specifier,
        dots: DotCount,
    ) -> BondageResult<Amount> {
        let spec = self.bonding_curve(&provider, &specifier)?;
        let issued = self.get_dots_issued(provider, specifier);
        Ok(tokens_for_dots(&spec, issued, dots)?)
    }

    /// Dots `tokens` would buy right now, and their exact cost
    pub fn calc_bond_rate(
        &self,
        provider: Address,
        specifier: Specifier,
        tokens: Amount,
    ) -> BondageResult<BondQuote> {
        let spec = self.bonding_curve(&provider, &specifier)?;
        let issued = self.get_dots_issued(provider, specifier);
        Ok(dots_for_tokens(&spec, issued, tokens)?)
    }

    // =========================================================================
    // Reads (never fail)
    // =========================================================================

    pub fn get_bound_dots(&self, subscriber: Address, provider: Address, specifier: Specifier) -> DotCount {
        self.ledger
            .bound_dots(&BondKey::new(subscriber, provider, specifier))
    }

    pub fn get_num_escrow(&self, subscriber: Address, provider: Address, specifier: Specifier) -> DotCount {
        self.ledger
            .escrowed_dots(&BondKey::new(subscriber, provider, specifier))
    }

    pub fn get_dots_issued(&self, provider: Address, specifier: Specifier) -> DotCount {
        self.ledger.dots_issued(&CurveKey::new(provider, specifier))
    }

    /// Token value locked against the curve: cost of every issued dot
    pub fn get_zap_bound(&self, provider: Address, specifier: Specifier) -> Amount {
        let issued = self.get_dots_issued(provider, specifier);
        if issued == 0 {
            return 0;
        }
        self.active_curve(&provider, &specifier)
            .ok()
            .and_then(|spec| tokens_for_dots(&spec, 0, issued).ok())
            .unwrap_or(0)
    }

    pub fn delegate_of(&self, subscriber: Address, provider: Address) -> Option<Address> {
        self.delegations.delegate_of(&subscriber, &provider)
    }

    // =========================================================================
    // Administration
    // =========================================================================

    /// Owner-only, once
    pub fn set_arbiter_address(&mut self, caller: Address, arbiter: Address) -> BondageResult<()> {
        self.authority.set_arbiter(&caller, arbiter)?;
        tracing::info!("Bonding service arbiter set to {}", arbiter);
        Ok(())
    }

    /// issued == Σ (bound + escrow) for the curve
    pub fn check_conservation(&self, provider: Address, specifier: Specifier) -> bool {
        let curve = CurveKey::new(provider, specifier);
        let holds = self.ledger.conservation_holds(&curve);
        if !holds {
            tracing::warn!(
                "Conservation violated on {}/{}: issued {}, held {}",
                provider,
                specifier,
                self.ledger.dots_issued(&curve),
                self.ledger.held_dots(&curve)
            );
        }
        holds
    }
}
