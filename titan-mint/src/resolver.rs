//! Template Resolver
//!
//! Maps a single hint string onto exactly one template by trying an ordered
//! list of strategies. The first strategy with a hit decides; a strategy with
//! more than one hit is a hard failure rather than a guess.

use titan_core::{CardTemplate, MintError, TemplateId, TitanResult};
use titan_storage::CardTx;

/// One way of interpreting a template hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverStrategy {
    /// Hint is the template's UUID.
    PrimaryKey,
    /// Hint is the print vendor group id, e.g. `000000000009`.
    ExternalGroup,
    /// Hint is the human SKU, e.g. `SL-REG`.
    SkuCode,
}

impl ResolverStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            ResolverStrategy::PrimaryKey => "primary_key",
            ResolverStrategy::ExternalGroup => "external_group",
            ResolverStrategy::SkuCode => "sku_code",
        }
    }

    async fn candidates(&self, tx: &mut dyn CardTx, hint: &str) -> TitanResult<Vec<CardTemplate>> {
        match self {
            ResolverStrategy::PrimaryKey => match hint.parse::<TemplateId>() {
                Ok(id) => Ok(tx.template_get(id).await?.into_iter().collect()),
                Err(_) => Ok(Vec::new()),
            },
            ResolverStrategy::ExternalGroup => tx.templates_by_external_group(hint).await,
            ResolverStrategy::SkuCode => tx.templates_by_sku(hint).await,
        }
    }
}

/// Ordered template lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateResolver {
    strategies: Vec<ResolverStrategy>,
}

impl Default for TemplateResolver {
    fn default() -> Self {
        Self::new(vec![
            ResolverStrategy::PrimaryKey,
            ResolverStrategy::ExternalGroup,
            ResolverStrategy::SkuCode,
        ])
    }
}

impl TemplateResolver {
    pub fn new(strategies: Vec<ResolverStrategy>) -> Self {
        Self { strategies }
    }

    pub fn strategies(&self) -> &[ResolverStrategy] {
        &self.strategies
    }

    /// Resolve `hint` to exactly one template.
    ///
    /// # Errors
    /// - `MintError::UnknownTemplate` when the hint is absent, blank or
    ///   matches nothing
    /// - `MintError::AmbiguousTemplate` when the deciding strategy matches
    ///   several templates
    pub async fn resolve(&self, tx: &mut dyn CardTx, hint: Option<&str>) -> TitanResult<CardTemplate> {
        let hint = match hint.map(str::trim).filter(|h| !h.is_empty()) {
            Some(h) => h,
            None => return Err(MintError::UnknownTemplate { hint: None }.into()),
        };

        for strategy in &self.strategies {
            let mut found = strategy.candidates(tx, hint).await?;
            match found.len() {
                0 => continue,
                1 => {
                    tracing::debug!(hint, strategy = strategy.name(), "template resolved");
                    return Ok(found.remove(0));
                }
                n => {
                    return Err(MintError::AmbiguousTemplate {
                        hint: hint.to_string(),
                        matches: n,
                    }
                    .into())
                }
            }
        }

        Err(MintError::UnknownTemplate {
            hint: Some(hint.to_string()),
        }
        .into())
    }
}
