use std::collections::HashMap;

use serde_json::json;

use crate::db::models::{NewWedding, Wedding, WeddingMember, WeddingSummary};
use crate::db::{from_row, from_rows, is_truthy, to_row, Gateway, Query};
use crate::error::AppError;

pub const WEDDINGS: &str = "weddings";
pub const WEDDING_MEMBERS: &str = "wedding_members";
pub const JOIN_PROCEDURE: &str = "join_wedding_with_code";

pub struct WeddingRepository;

impl WeddingRepository {
    pub async fn create(gateway: &dyn Gateway, wedding: &NewWedding) -> Result<Wedding, AppError> {
        let rows = gateway.insert(WEDDINGS, vec![to_row(wedding)?]).await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Internal("Failed to fetch created wedding".to_string()))?;
        from_row(row)
    }

    pub async fn add_member(
        gateway: &dyn Gateway,
        member: &WeddingMember,
    ) -> Result<(), AppError> {
        gateway
            .insert(WEDDING_MEMBERS, vec![to_row(member)?])
            .await?;
        Ok(())
    }

    /// Memberships of `user_id`, ordered by wedding id, each joined with its wedding.
    pub async fn list_for_user(
        gateway: &dyn Gateway,
        user_id: &str,
    ) -> Result<Vec<WeddingSummary>, AppError> {
        let members: Vec<WeddingMember> = from_rows(
            gateway
                .select(
                    WEDDING_MEMBERS,
                    &Query::new()
                        .columns("wedding_id,user_id,role")
                        .eq("user_id", user_id)
                        .order("wedding_id"),
                )
                .await?,
        )?;
        if members.is_empty() {
            return Ok(Vec::new());
        }

        let weddings: Vec<Wedding> = from_rows(
            gateway
                .select(
                    WEDDINGS,
                    &Query::new()
                        .columns("id,title,date,venue")
                        .is_in("id", members.iter().map(|m| m.wedding_id.clone())),
                )
                .await?,
        )?;
        let mut by_id: HashMap<String, Wedding> =
            weddings.into_iter().map(|w| (w.id.clone(), w)).collect();

        Ok(members
            .into_iter()
            .map(|member| WeddingSummary {
                wedding: by_id.remove(&member.wedding_id),
                wedding_id: member.wedding_id,
                role: member.role,
            })
            .collect())
    }

    /// Asks the server to verify `code` and grant `role`. Anything falsy from
    /// the procedure means the code was rejected.
    pub async fn join_with_code(
        gateway: &dyn Gateway,
        wedding_id: &str,
        role: &str,
        code: &str,
    ) -> Result<bool, AppError> {
        let result = gateway
            .rpc(
                JOIN_PROCEDURE,
                json!({ "wid": wedding_id, "role_in": role, "code_in": code }),
            )
            .await?;
        Ok(is_truthy(&result))
    }
}
