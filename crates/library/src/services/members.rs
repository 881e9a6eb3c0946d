use super::{sort_items, validate};
use crate::error::{LibraryError, Result};
use crate::notify::{ChangeBus, EntityKind};
use shelfmark_core::{BookCopy, Member, MemberId, NewMember, SortOrder};
use shelfmark_database::{Repositories, Repository};

/// Library members
#[derive(Debug, Clone)]
pub struct MemberService {
    repos: Repositories,
    bus: ChangeBus,
}

change_feed!(MemberService, crate::notify::EntityKind::Member);

impl MemberService {
    pub fn new(repos: Repositories, bus: ChangeBus) -> Self {
        Self { repos, bus }
    }

    /// Registers a member; the SSN must not belong to anyone else
    pub async fn add(&self, mut draft: NewMember) -> Result<Member> {
        draft.ssn = draft.ssn.trim().to_string();
        validate("Member", &draft)?;
        self.ensure_ssn_free(&draft.ssn, None).await?;

        let member = self.repos.members.add(&draft).await?;
        log::info!("Added member {} ({})", member.name, member.id);
        self.bus.publish(EntityKind::Member);
        Ok(member)
    }

    pub async fn all(&self) -> Result<Vec<Member>> {
        Ok(self.repos.members.all().await?)
    }

    pub async fn find(&self, id: MemberId) -> Result<Option<Member>> {
        Ok(self.repos.members.find(id).await?)
    }

    pub async fn find_by_ssn(&self, ssn: &str) -> Result<Option<Member>> {
        Ok(self.repos.members.by_ssn(ssn.trim()).await?)
    }

    pub async fn sorted(&self, field: &str, order: SortOrder) -> Result<Vec<Member>> {
        sort_items(self.all().await?, field, order)
    }

    /// Copies the member currently holds
    pub async fn copies_on_loan(&self, id: MemberId) -> Result<Vec<BookCopy>> {
        Ok(self.repos.copies.held_by(id).await?)
    }

    pub async fn edit(&self, member: &Member) -> Result<()> {
        let member = Member {
            ssn: member.ssn.trim().to_string(),
            ..member.clone()
        };
        validate("Member", &member)?;
        self.require(member.id).await?;
        self.ensure_ssn_free(&member.ssn, Some(member.id)).await?;

        self.repos.members.edit(&member).await?;
        log::info!("Updated member {}", member.id);
        self.bus.publish(EntityKind::Member);
        Ok(())
    }

    pub async fn rename(&self, id: MemberId, name: impl Into<String>) -> Result<Member> {
        let mut member = self.require(id).await?;
        member.name = name.into();
        self.edit(&member).await?;
        Ok(member)
    }

    /// Removes a member with no open loans, along with their loan history
    pub async fn remove(&self, id: MemberId) -> Result<()> {
        self.require(id).await?;

        let open = self.repos.loans.open_count_for_member(id).await?;
        if open > 0 {
            log::warn!("Refusing to remove member {}: {} open loans", id, open);
            return Err(LibraryError::MemberHasOpenLoans {
                member_id: id.get(),
                open,
            });
        }

        self.repos.members.remove(id).await?;
        log::info!("Removed member {}", id);
        self.bus.publish(EntityKind::Member);
        self.bus.publish(EntityKind::Loan);
        Ok(())
    }

    async fn require(&self, id: MemberId) -> Result<Member> {
        self.find(id).await?.ok_or(LibraryError::NotFound {
            entity: "Member",
            id: id.get(),
        })
    }

    async fn ensure_ssn_free(&self, ssn: &str, owner: Option<MemberId>) -> Result<()> {
        match self.find_by_ssn(ssn).await? {
            Some(existing) if Some(existing.id) != owner => {
                log::warn!("SSN {} already registered to member {}", ssn, existing.id);
                Err(LibraryError::AlreadyExists {
                    entity: "Member",
                    key: ssn.to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{count_changes, seen, setup};

    #[tokio::test]
    async fn test_duplicate_ssn_rejected() -> Result<()> {
        let (repos, bus) = setup().await?;
        let changes = count_changes(&bus, EntityKind::Member);
        let service = MemberService::new(repos, bus);

        service.add(NewMember::new("Eric", "555")).await?;
        let err = service.add(NewMember::new("Other", "555")).await.unwrap_err();

        assert!(matches!(err, LibraryError::AlreadyExists { entity: "Member", ref key } if key == "555"));
        assert_eq!(service.all().await?.len(), 1);
        assert_eq!(seen(&changes), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_ssn_whitespace_does_not_bypass_uniqueness() -> Result<()> {
        let (repos, bus) = setup().await?;
        let service = MemberService::new(repos, bus);

        let eric = service.add(NewMember::new("Eric", " 555 ")).await?;
        assert_eq!(eric.ssn, "555");

        let err = service.add(NewMember::new("Sonia", "555")).await.unwrap_err();
        assert!(matches!(err, LibraryError::AlreadyExists { ref key, .. } if key == "555"));
        assert_eq!(service.find_by_ssn(" 555").await?.map(|m| m.id), Some(eric.id));
        assert_eq!(service.all().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_fields_reported_together() -> Result<()> {
        let (repos, bus) = setup().await?;
        let service = MemberService::new(repos, bus);

        let err = service.add(NewMember::new("", "")).await.unwrap_err();
        match err {
            LibraryError::Validation { message, .. } => {
                assert!(message.contains("Name"));
                assert!(message.contains("SSN"));
            }
            other => panic!("unexpected error: {other}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_rename_keeps_own_ssn() -> Result<()> {
        let (repos, bus) = setup().await?;
        let service = MemberService::new(repos, bus);

        let member = service.add(NewMember::new("Eric", "123")).await?;
        let renamed = service.rename(member.id, "Eric Blair").await?;

        assert_eq!(renamed.ssn, "123");
        assert_eq!(
            service.find_by_ssn("123").await?.map(|m| m.name),
            Some("Eric Blair".to_string())
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_edit_cannot_steal_ssn() -> Result<()> {
        let (repos, bus) = setup().await?;
        let service = MemberService::new(repos, bus);

        service.add(NewMember::new("Eric", "123")).await?;
        let mut other = service.add(NewMember::new("Sonia", "456")).await?;
        other.ssn = "123".to_string();

        let err = service.edit(&other).await.unwrap_err();
        assert!(matches!(err, LibraryError::AlreadyExists { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_member_without_loans() -> Result<()> {
        let (repos, bus) = setup().await?;
        let service = MemberService::new(repos, bus);

        let member = service.add(NewMember::new("Eric", "123")).await?;
        assert!(service.copies_on_loan(member.id).await?.is_empty());

        service.remove(member.id).await?;
        assert!(service.find(member.id).await?.is_none());

        let err = service.remove(member.id).await.unwrap_err();
        assert!(matches!(err, LibraryError::NotFound { .. }));
        Ok(())
    }
}
