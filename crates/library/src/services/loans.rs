//! Lending and returning copies
//!
//! A loan pairs one copy with one member. Opening a loan moves the copy to
//! `OnLoan`; closing it puts the copy back on the shelf with some wear. The
//! loan row and the copy row are always written in the same transaction.

use super::sort_items;
use crate::error::{LibraryError, Result};
use crate::notify::{ChangeBus, EntityKind};
use crate::wear::{RandomWear, WearModel};
use shelfmark_config::{ConfigSection, LendingConfig};
use shelfmark_core::{
    AppError, BookCopy, CopyId, CopyState, Loan, LoanId, Member, MemberId, NewLoan,
    OverdueNotice, SortOrder, Timestamp, DEFAULT_FEE_PER_DAY, DEFAULT_LOAN_PERIOD_DAYS,
};
use shelfmark_database::{Repositories, Repository};
use std::sync::Arc;

/// Lending rules applied by `LoanService`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LendingPolicy {
    pub loan_period_days: u32,
    pub fee_per_day: i64,
    /// Upper bound of the condition lost on each return
    pub max_wear: i32,
}

impl Default for LendingPolicy {
    fn default() -> Self {
        Self {
            loan_period_days: DEFAULT_LOAN_PERIOD_DAYS,
            fee_per_day: DEFAULT_FEE_PER_DAY,
            max_wear: 2,
        }
    }
}

/// Out-of-range settings are rejected rather than applied to new loans
impl TryFrom<&LendingConfig> for LendingPolicy {
    type Error = LibraryError;

    fn try_from(config: &LendingConfig) -> Result<Self> {
        config.validate().map_err(|errors| {
            LibraryError::validation(
                config.section_name(),
                errors.iter().map(|e| e.to_string()).collect(),
            )
        })?;

        Ok(Self {
            loan_period_days: config.loan_period_days,
            fee_per_day: config.fee_per_day,
            max_wear: config.max_wear,
        })
    }
}

/// Result of a successful return
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnOutcome {
    pub loan: Loan,
    pub copy: BookCopy,
    /// Present when the copy came back after its due date
    pub notice: Option<OverdueNotice>,
}

#[derive(Clone)]
pub struct LoanService {
    repos: Repositories,
    bus: ChangeBus,
    policy: LendingPolicy,
    wear: Arc<dyn WearModel>,
}

change_feed!(LoanService, crate::notify::EntityKind::Loan);

impl LoanService {
    pub fn new(repos: Repositories, bus: ChangeBus, policy: LendingPolicy) -> Self {
        let wear = Arc::new(RandomWear::new(policy.max_wear));
        Self::with_wear(repos, bus, policy, wear)
    }

    pub fn with_wear(
        repos: Repositories,
        bus: ChangeBus,
        policy: LendingPolicy,
        wear: Arc<dyn WearModel>,
    ) -> Self {
        Self {
            repos,
            bus,
            policy,
            wear,
        }
    }

    pub fn policy(&self) -> LendingPolicy {
        self.policy
    }

    pub async fn create_loan(&self, copy_id: CopyId, member_id: MemberId) -> Result<Loan> {
        self.create_loan_at(copy_id, member_id, Timestamp::now()).await
    }

    /// Lends a copy to a member as of `now`
    pub async fn create_loan_at(
        &self,
        copy_id: CopyId,
        member_id: MemberId,
        now: Timestamp,
    ) -> Result<Loan> {
        let mut copy = self.require_copy(copy_id).await?;
        if self.repos.members.find(member_id).await?.is_none() {
            return Err(LibraryError::NotFound {
                entity: "Member",
                id: member_id.get(),
            });
        }

        if copy.lend().is_err() {
            log::warn!("Copy {} cannot be lent: {}", copy_id, copy.state);
            return Err(LibraryError::CopyUnavailable {
                copy_id: copy_id.get(),
                state: copy.state,
            });
        }

        let draft = NewLoan::starting_at(copy_id, member_id, now, self.policy.loan_period_days);
        let loan = match self.repos.loans.lend(&copy, &draft).await {
            Ok(loan) => loan,
            // Someone else lent the copy between our read and the write
            Err(AppError::InvalidTransition { .. }) => {
                let state = self
                    .repos
                    .copies
                    .find(copy_id)
                    .await?
                    .map(|stored| stored.state)
                    .unwrap_or(CopyState::OnLoan);
                return Err(LibraryError::CopyUnavailable {
                    copy_id: copy_id.get(),
                    state,
                });
            }
            Err(e) => return Err(e.into()),
        };

        log::info!(
            "Loan {} opened: copy {} to member {}, due {}",
            loan.id,
            copy_id,
            member_id,
            loan.due_at
        );
        self.bus.publish(EntityKind::Loan);
        self.bus.publish(EntityKind::BookCopy);
        Ok(loan)
    }

    pub async fn return_loan(&self, id: LoanId) -> Result<ReturnOutcome> {
        self.return_loan_at(id, Timestamp::now()).await
    }

    /// Closes an open loan as of `now` and puts the copy back on the shelf
    pub async fn return_loan_at(&self, id: LoanId, now: Timestamp) -> Result<ReturnOutcome> {
        let mut loan = self.require(id).await?;
        if loan.close(now).is_err() {
            log::warn!("Loan {} was already returned", id);
            return Err(LibraryError::LoanAlreadyReturned { loan_id: id.get() });
        }

        let mut copy = self.require_copy(loan.copy_id).await?;
        copy.return_with_wear(self.wear.wear())?;

        match self.repos.loans.close(&loan, &copy).await {
            Ok(()) => {}
            Err(AppError::InvalidTransition { .. }) => {
                return Err(LibraryError::LoanAlreadyReturned { loan_id: id.get() });
            }
            Err(e) => return Err(e.into()),
        }

        let notice = OverdueNotice::assess(&loan, now, self.policy.fee_per_day);
        match notice {
            Some(n) => log::info!("Loan {} closed: {}", id, n),
            None => log::info!("Loan {} closed on time", id),
        }

        self.bus.publish(EntityKind::Loan);
        self.bus.publish(EntityKind::BookCopy);
        Ok(ReturnOutcome { loan, copy, notice })
    }

    /// Deletes a closed loan from the history
    pub async fn remove_loan(&self, id: LoanId) -> Result<()> {
        let loan = self.require(id).await?;
        if loan.is_open() {
            log::warn!("Refusing to remove open loan {}", id);
            return Err(LibraryError::LoanStillOpen { loan_id: id.get() });
        }

        self.repos.loans.remove(id).await?;
        log::info!("Removed loan {}", id);
        self.bus.publish(EntityKind::Loan);
        Ok(())
    }

    /// Moves every lent copy whose loan is past due to `Overdue`
    ///
    /// Returns how many copies changed state.
    pub async fn mark_overdue(&self, now: Timestamp) -> Result<usize> {
        let mut changed = Vec::new();

        for loan in self.repos.loans.past_due(now).await? {
            let Some(mut copy) = self.repos.copies.find(loan.copy_id).await? else {
                continue;
            };
            if copy.state == CopyState::OnLoan {
                copy.mark_overdue()?;
                changed.push(copy);
            }
        }

        if changed.is_empty() {
            log::debug!("Overdue sweep found nothing to flag");
            return Ok(0);
        }

        self.repos.copies.edit_many(&changed).await?;
        log::info!("Flagged {} copies as overdue", changed.len());
        self.bus.publish(EntityKind::BookCopy);
        Ok(changed.len())
    }

    pub async fn all(&self) -> Result<Vec<Loan>> {
        Ok(self.repos.loans.all().await?)
    }

    pub async fn find(&self, id: LoanId) -> Result<Option<Loan>> {
        Ok(self.repos.loans.find(id).await?)
    }

    pub async fn sorted(&self, field: &str, order: SortOrder) -> Result<Vec<Loan>> {
        sort_items(self.all().await?, field, order)
    }

    pub async fn open_loans(&self) -> Result<Vec<Loan>> {
        Ok(self.repos.loans.open().await?)
    }

    /// Open loans past their due date at `now`
    pub async fn overdue_loans(&self, now: Timestamp) -> Result<Vec<Loan>> {
        Ok(self.repos.loans.past_due(now).await?)
    }

    pub async fn loans_of_member(&self, member_id: MemberId) -> Result<Vec<Loan>> {
        Ok(self.repos.loans.by_member(member_id).await?)
    }

    /// The member currently holding a copy, if it is lent out
    pub async fn member_holding_copy(&self, copy_id: CopyId) -> Result<Option<Member>> {
        match self.repos.loans.open_for_copy(copy_id).await? {
            Some(loan) => Ok(self.repos.members.find(loan.member_id).await?),
            None => Ok(None),
        }
    }

    async fn require(&self, id: LoanId) -> Result<Loan> {
        self.find(id).await?.ok_or(LibraryError::NotFound {
            entity: "Loan",
            id: id.get(),
        })
    }

    async fn require_copy(&self, id: CopyId) -> Result<BookCopy> {
        self.repos
            .copies
            .find(id)
            .await?
            .ok_or(LibraryError::NotFound {
                entity: "BookCopy",
                id: id.get(),
            })
    }
}

impl std::fmt::Debug for LoanService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoanService")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
