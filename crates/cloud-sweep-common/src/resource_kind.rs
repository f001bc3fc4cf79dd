//! Resource kinds and sweep ordering
//!
//! Kinds are swept one at a time; the order keeps front-door resources
//! (load balancers) ahead of the compute they route to.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// Types of cloud resources cloud-sweep knows how to nuke
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    AsRefStr,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum ResourceKind {
    /// Application/Network/Gateway load balancer (ELBv2)
    #[strum(serialize = "elbv2")]
    #[serde(rename = "elbv2")]
    LoadBalancerV2,
    /// EC2 instance
    #[strum(serialize = "ec2")]
    #[serde(rename = "ec2")]
    Ec2Instance,
}

impl ResourceKind {
    /// CLI/config name of this kind
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }

    /// Human-readable description for logs and tables
    pub fn description(self) -> &'static str {
        match self {
            ResourceKind::LoadBalancerV2 => "ELBv2 load balancer",
            ResourceKind::Ec2Instance => "EC2 instance",
        }
    }

    /// Sweep priority (lower number = swept first)
    pub fn sweep_priority(self) -> u8 {
        match self {
            ResourceKind::LoadBalancerV2 => 0,
            ResourceKind::Ec2Instance => 1,
        }
    }

    /// All supported kinds in sweep order
    pub fn all() -> Vec<ResourceKind> {
        let mut kinds: Vec<_> = ResourceKind::iter().collect();
        kinds.sort_by_key(|k| k.sweep_priority());
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_cli_names_round_trip() {
        for kind in ResourceKind::all() {
            assert_eq!(ResourceKind::from_str(kind.as_str()).unwrap(), kind);
        }
        assert_eq!(ResourceKind::LoadBalancerV2.to_string(), "elbv2");
        assert_eq!(ResourceKind::Ec2Instance.to_string(), "ec2");
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(
            ResourceKind::from_str("ELBv2").unwrap(),
            ResourceKind::LoadBalancerV2
        );
        assert!(ResourceKind::from_str("s3").is_err());
    }

    #[test]
    fn test_load_balancers_before_instances() {
        assert!(
            ResourceKind::LoadBalancerV2.sweep_priority()
                < ResourceKind::Ec2Instance.sweep_priority()
        );
        assert_eq!(ResourceKind::all().first(), Some(&ResourceKind::LoadBalancerV2));
    }
}
