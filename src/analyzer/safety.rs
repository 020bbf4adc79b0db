//! Safety warnings derived from an issue's risk score.

pub const HIGH_RISK_ADVISORY: &str = "⚠️ HIGH RISK! We recommend consulting a professional.";
pub const SHUT_OFF_MAIN: &str =
    "Shut off the relevant utility main (electricity/water/gas) before working.";
pub const CAUTION_ADVISORY: &str = "⚠️ Be careful and follow the safety instructions.";
pub const CONSULT_PROFESSIONAL: &str = "If you are unsure, consult a professional.";
pub const BASIC_SAFETY: &str = "Follow basic safety rules.";

/// Severity tier of a risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskTier {
    /// 4 and below.
    Low,
    /// 5 to 7.
    Caution,
    /// 8 and above.
    High,
}

impl RiskTier {
    pub fn from_score(risk_score: u8) -> Self {
        match risk_score {
            8.. => RiskTier::High,
            5..=7 => RiskTier::Caution,
            _ => RiskTier::Low,
        }
    }

    pub fn warnings(&self) -> &'static [&'static str] {
        match self {
            RiskTier::High => &[HIGH_RISK_ADVISORY, SHUT_OFF_MAIN],
            RiskTier::Caution => &[CAUTION_ADVISORY, CONSULT_PROFESSIONAL],
            RiskTier::Low => &[BASIC_SAFETY],
        }
    }
}

/// Warnings to show for an issue with the given risk score.
pub fn safety_warnings(risk_score: u8) -> Vec<String> {
    RiskTier::from_score(risk_score)
        .warnings()
        .iter()
        .map(|w| w.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(RiskTier::from_score(1), RiskTier::Low);
        assert_eq!(RiskTier::from_score(4), RiskTier::Low);
        assert_eq!(RiskTier::from_score(5), RiskTier::Caution);
        assert_eq!(RiskTier::from_score(7), RiskTier::Caution);
        assert_eq!(RiskTier::from_score(8), RiskTier::High);
        assert_eq!(RiskTier::from_score(10), RiskTier::High);
    }

    #[test]
    fn test_high_risk_warnings() {
        let warnings = safety_warnings(8);
        assert_eq!(warnings, vec![HIGH_RISK_ADVISORY, SHUT_OFF_MAIN]);
    }

    #[test]
    fn test_caution_warnings() {
        for score in [5, 7] {
            let warnings = safety_warnings(score);
            assert_eq!(warnings, vec![CAUTION_ADVISORY, CONSULT_PROFESSIONAL]);
        }
    }

    #[test]
    fn test_low_risk_has_only_reminder() {
        assert_eq!(safety_warnings(4), vec![BASIC_SAFETY]);
        assert_eq!(safety_warnings(0), vec![BASIC_SAFETY]);
    }
}
