//! [`IamApi`] implementation backed by the official AWS SDK.
//!
//! Credentials come from the standard AWS chain (environment, shared
//! credentials file, instance profile, task role); the provider never
//! receives credentials of its own.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_iam::error::{DisplayErrorContext, SdkError};
use aws_sdk_iam::primitives::DateTime as AwsDateTime;
use aws_sdk_iam::types::{StatusType, Tag as AwsTag};
use chrono::{DateTime, Utc};

use super::api::{AccessKeyRecord, IamApi, IamUser, KeyStatus, NewAccessKey, Tag};
use super::error::{IamError, IamResult};
use crate::config::AwsSettings;
use crate::provider::SensitiveString;

/// Identity service client over `aws-sdk-iam` and `aws-sdk-sts`.
#[derive(Debug, Clone)]
pub struct AwsIamClient {
    iam: aws_sdk_iam::Client,
    sts: aws_sdk_sts::Client,
}

impl AwsIamClient {
    /// Build clients from the ambient AWS configuration plus overrides.
    pub async fn from_settings(settings: &AwsSettings) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(region) = &settings.region {
            loader = loader.region(aws_sdk_iam::config::Region::new(region.clone()));
        }
        if let Some(profile) = &settings.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(endpoint) = &settings.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let config = loader.load().await;

        tracing::debug!(
            region = ?config.region(),
            "AWS identity clients configured"
        );

        Self {
            iam: aws_sdk_iam::Client::new(&config),
            sts: aws_sdk_sts::Client::new(&config),
        }
    }
}

fn sdk_error<E, R>(operation: &'static str, err: SdkError<E, R>) -> IamError
where
    E: std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    IamError::service(operation, DisplayErrorContext(&err).to_string())
}

fn to_chrono(dt: &AwsDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}

fn to_aws_tags(operation: &'static str, tags: &[Tag]) -> IamResult<Vec<AwsTag>> {
    tags.iter()
        .map(|t| {
            AwsTag::builder()
                .key(&t.key)
                .value(&t.value)
                .build()
                .map_err(|e| IamError::service(operation, e.to_string()))
        })
        .collect()
}

fn to_aws_status(status: &KeyStatus) -> StatusType {
    StatusType::from(status.as_str())
}

#[async_trait]
impl IamApi for AwsIamClient {
    async fn get_user(&self, user_name: &str) -> IamResult<IamUser> {
        let resp = match self.iam.get_user().user_name(user_name).send().await {
            Ok(resp) => resp,
            Err(err) => {
                let missing = err
                    .as_service_error()
                    .is_some_and(|e| e.is_no_such_entity_exception());
                if missing {
                    return Err(IamError::user_not_found(user_name));
                }
                return Err(sdk_error("GetUser", err));
            }
        };

        let user = resp.user().ok_or(IamError::MissingField {
            operation: "GetUser",
            field: "User",
        })?;

        Ok(IamUser {
            user_name: user.user_name().to_string(),
            tags: user
                .tags()
                .iter()
                .map(|t| Tag::new(t.key(), t.value()))
                .collect(),
        })
    }

    async fn create_user(&self, user_name: &str, tags: &[Tag]) -> IamResult<()> {
        self.iam
            .create_user()
            .user_name(user_name)
            .set_tags(Some(to_aws_tags("CreateUser", tags)?))
            .send()
            .await
            .map_err(|e| sdk_error("CreateUser", e))?;
        Ok(())
    }

    async fn tag_user(&self, user_name: &str, tags: &[Tag]) -> IamResult<()> {
        self.iam
            .tag_user()
            .user_name(user_name)
            .set_tags(Some(to_aws_tags("TagUser", tags)?))
            .send()
            .await
            .map_err(|e| sdk_error("TagUser", e))?;
        Ok(())
    }

    async fn list_access_keys(&self, user_name: &str) -> IamResult<Vec<AccessKeyRecord>> {
        let resp = self
            .iam
            .list_access_keys()
            .user_name(user_name)
            .send()
            .await
            .map_err(|e| sdk_error("ListAccessKeys", e))?;

        let mut keys = Vec::new();
        for meta in resp.access_key_metadata() {
            let access_key_id = meta.access_key_id().ok_or(IamError::MissingField {
                operation: "ListAccessKeys",
                field: "AccessKeyId",
            })?;

            keys.push(AccessKeyRecord {
                access_key_id: access_key_id.to_string(),
                user_name: meta.user_name().unwrap_or(user_name).to_string(),
                status: meta
                    .status()
                    .map(|s| KeyStatus::from(s.as_str()))
                    .unwrap_or_else(|| KeyStatus::Unknown(String::new())),
                create_date: meta.create_date().and_then(to_chrono),
                last_used: None,
            });
        }

        Ok(keys)
    }

    async fn get_access_key_last_used(
        &self,
        access_key_id: &str,
    ) -> IamResult<Option<DateTime<Utc>>> {
        let resp = self
            .iam
            .get_access_key_last_used()
            .access_key_id(access_key_id)
            .send()
            .await
            .map_err(|e| sdk_error("GetAccessKeyLastUsed", e))?;

        Ok(resp
            .access_key_last_used()
            .and_then(|u| u.last_used_date())
            .and_then(to_chrono))
    }

    async fn create_access_key(&self, user_name: &str) -> IamResult<NewAccessKey> {
        let resp = self
            .iam
            .create_access_key()
            .user_name(user_name)
            .send()
            .await
            .map_err(|e| sdk_error("CreateAccessKey", e))?;

        let key = resp.access_key().ok_or(IamError::MissingField {
            operation: "CreateAccessKey",
            field: "AccessKey",
        })?;

        Ok(NewAccessKey {
            access_key_id: key.access_key_id().to_string(),
            user_name: key.user_name().to_string(),
            secret_access_key: SensitiveString::new(key.secret_access_key()),
        })
    }

    async fn delete_access_key(&self, user_name: &str, access_key_id: &str) -> IamResult<()> {
        self.iam
            .delete_access_key()
            .user_name(user_name)
            .access_key_id(access_key_id)
            .send()
            .await
            .map_err(|e| sdk_error("DeleteAccessKey", e))?;
        Ok(())
    }

    async fn update_access_key(
        &self,
        user_name: &str,
        access_key_id: &str,
        status: KeyStatus,
    ) -> IamResult<()> {
        self.iam
            .update_access_key()
            .user_name(user_name)
            .access_key_id(access_key_id)
            .status(to_aws_status(&status))
            .send()
            .await
            .map_err(|e| sdk_error("UpdateAccessKey", e))?;
        Ok(())
    }

    async fn list_groups_for_user(&self, user_name: &str) -> IamResult<Vec<String>> {
        let resp = self
            .iam
            .list_groups_for_user()
            .user_name(user_name)
            .send()
            .await
            .map_err(|e| sdk_error("ListGroupsForUser", e))?;

        Ok(resp
            .groups()
            .iter()
            .map(|g| g.group_name().to_string())
            .collect())
    }

    async fn add_user_to_group(&self, user_name: &str, group_name: &str) -> IamResult<()> {
        self.iam
            .add_user_to_group()
            .user_name(user_name)
            .group_name(group_name)
            .send()
            .await
            .map_err(|e| sdk_error("AddUserToGroup", e))?;
        Ok(())
    }

    async fn remove_user_from_group(&self, user_name: &str, group_name: &str) -> IamResult<()> {
        self.iam
            .remove_user_from_group()
            .user_name(user_name)
            .group_name(group_name)
            .send()
            .await
            .map_err(|e| sdk_error("RemoveUserFromGroup", e))?;
        Ok(())
    }

    async fn list_attached_user_policies(&self, user_name: &str) -> IamResult<Vec<String>> {
        let resp = self
            .iam
            .list_attached_user_policies()
            .user_name(user_name)
            .send()
            .await
            .map_err(|e| sdk_error("ListAttachedUserPolicies", e))?;

        Ok(resp
            .attached_policies()
            .iter()
            .filter_map(|p| p.policy_arn().map(str::to_string))
            .collect())
    }

    async fn attach_user_policy(&self, user_name: &str, policy_arn: &str) -> IamResult<()> {
        self.iam
            .attach_user_policy()
            .user_name(user_name)
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|e| sdk_error("AttachUserPolicy", e))?;
        Ok(())
    }

    async fn detach_user_policy(&self, user_name: &str, policy_arn: &str) -> IamResult<()> {
        self.iam
            .detach_user_policy()
            .user_name(user_name)
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|e| sdk_error("DetachUserPolicy", e))?;
        Ok(())
    }

    async fn caller_account_id(&self) -> IamResult<String> {
        let resp = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| sdk_error("GetCallerIdentity", e))?;

        resp.account()
            .map(str::to_string)
            .ok_or(IamError::MissingField {
                operation: "GetCallerIdentity",
                field: "Account",
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_chrono_conversion() {
        let dt = AwsDateTime::from_secs(1_700_000_000);
        let converted = to_chrono(&dt).unwrap();
        assert_eq!(converted.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(to_aws_status(&KeyStatus::Active), StatusType::Active);
        assert_eq!(to_aws_status(&KeyStatus::Inactive), StatusType::Inactive);
    }

    #[test]
    fn test_tag_conversion() {
        let tags = vec![Tag::new("managedby", "keydra"), Tag::new("team", "infra")];
        let converted = to_aws_tags("TagUser", &tags).unwrap();
        assert_eq!(converted.len(), 2);
        assert_eq!(converted[0].key(), "managedby");
        assert_eq!(converted[1].value(), "infra");
    }
}
