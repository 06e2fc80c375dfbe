use crate::domain::model::Labware;
use crate::domain::ports::BusinessRuleCheck;
use async_trait::async_trait;

/// Site-configurable acceptance rules for scanned labware.
#[derive(Debug, Clone, Default)]
pub struct LabwareRules {
    pub allowed_types: Vec<String>,
    pub max_labware: Option<usize>,
    pub require_samples: bool,
}

#[async_trait]
impl BusinessRuleCheck<Labware> for LabwareRules {
    async fn check(&self, existing: &[Labware], candidate: &Labware) -> Vec<String> {
        let mut violations = Vec::new();

        if !self.allowed_types.is_empty()
            && !self
                .allowed_types
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(&candidate.labware_type))
        {
            violations.push(format!(
                "\"{}\" is a {}; expected {}",
                candidate.barcode,
                candidate.labware_type,
                self.allowed_types.join(" or ")
            ));
        }

        if let Some(max) = self.max_labware {
            if existing.len() >= max {
                violations.push(format!("No more than {} labware may be scanned", max));
            }
        }

        if self.require_samples && !candidate.grid.slots.iter().any(|slot| slot.occupied) {
            violations.push(format!("\"{}\" has no samples", candidate.barcode));
        }

        violations
    }
}
