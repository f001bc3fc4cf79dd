//! Caller identity checks run before a destructive sweep

use super::context::AwsContext;
use anyhow::{Context, Result, bail};
use tracing::info;

/// Strongly-typed AWS account ID (12-digit string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display, derive_more::Deref)]
pub struct AccountId(String);

/// Who the loaded credentials belong to
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub account_id: AccountId,
    pub arn: Option<String>,
}

/// Resolve the caller's account through STS GetCallerIdentity.
///
/// Needs no IAM permissions, so it doubles as a credential check.
pub async fn caller_identity(ctx: &AwsContext) -> Result<CallerIdentity> {
    let identity = ctx
        .sts_client()
        .get_caller_identity()
        .send()
        .await
        .context("Failed to get AWS caller identity - check credentials")?;

    let account = identity
        .account()
        .context("No account ID returned from STS GetCallerIdentity")?;

    Ok(CallerIdentity {
        account_id: AccountId(account.to_string()),
        arn: identity.arn().map(str::to_string),
    })
}

/// Resolve the caller's account and refuse to continue if it is not the
/// account the operator said they meant to sweep.
pub async fn validate_account(ctx: &AwsContext, expected: Option<&str>) -> Result<AccountId> {
    let identity = caller_identity(ctx).await?;
    check_expected(&identity.account_id, expected)?;

    info!(
        account_id = %identity.account_id,
        arn = identity.arn.as_deref().unwrap_or("unknown"),
        "AWS account validated"
    );
    Ok(identity.account_id)
}

fn check_expected(actual: &AccountId, expected: Option<&str>) -> Result<()> {
    match expected {
        Some(expected) if expected != actual.as_str() => bail!(
            "Credentials belong to account {actual}, but account {expected} was requested"
        ),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_account_must_match() {
        let actual = AccountId("123456789012".to_string());
        assert!(check_expected(&actual, None).is_ok());
        assert!(check_expected(&actual, Some("123456789012")).is_ok());

        let err = check_expected(&actual, Some("210987654321")).unwrap_err();
        assert!(err.to_string().contains("210987654321"));
    }

    #[tokio::test]
    #[ignore = "requires AWS credentials"]
    async fn test_caller_identity() {
        let ctx = AwsContext::new("us-east-1").await;
        let identity = caller_identity(&ctx).await.unwrap();
        assert_eq!(identity.account_id.len(), 12);
    }
}
