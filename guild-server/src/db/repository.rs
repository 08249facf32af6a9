//! Repository traits
//!
//! Methods named `lock_*` take a row lock for the rest of the transaction
//! and must be used before any read-compute-write on that row.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::models::{
    Automation, AutomationLog, AutomationUpdate, Communication, CommunicationRecipient,
    DashboardSummary, Donation, DonationQuery, Event, EventCreate, EventRegistration, EventUpdate,
    Member, MemberActivity, MemberCreate, MemberQuery, MemberUpdate, NewActivity, NewAutomation,
    NewAutomationLog, NewCommunication, NewDonation, NewRegistration, RegistrationStatus,
    SegmentFilter, Tier, TriggerType,
};

use super::RepoResult;

#[async_trait]
pub trait MemberRepository {
    async fn list_members(&mut self, query: &MemberQuery) -> RepoResult<Vec<Member>>;
    async fn find_member(&mut self, id: i64) -> RepoResult<Option<Member>>;
    async fn lock_member(&mut self, id: i64) -> RepoResult<Option<Member>>;
    /// `Duplicate` when the email is taken
    async fn insert_member(&mut self, data: &MemberCreate, now: i64) -> RepoResult<Member>;
    async fn update_member(
        &mut self,
        id: i64,
        data: &MemberUpdate,
        now: i64,
    ) -> RepoResult<Option<Member>>;
    /// Write the derived giving fields
    async fn update_member_giving(
        &mut self,
        id: i64,
        total_donated: Decimal,
        tier: Tier,
        last_donation_date: Option<NaiveDate>,
        now: i64,
    ) -> RepoResult<()>;
    async fn deactivate_member(&mut self, id: i64, now: i64) -> RepoResult<bool>;
    /// Sorted, de-duplicated member ids selected by `filter`
    async fn segment_member_ids(&mut self, filter: &SegmentFilter) -> RepoResult<Vec<i64>>;
}

#[async_trait]
pub trait DonationRepository {
    /// Newest first
    async fn list_donations(&mut self, query: &DonationQuery) -> RepoResult<Vec<Donation>>;
    async fn find_donation(&mut self, id: i64) -> RepoResult<Option<Donation>>;
    async fn lock_donation(&mut self, id: i64) -> RepoResult<Option<Donation>>;
    /// `Duplicate` when the receipt number is taken
    async fn insert_donation(&mut self, data: &NewDonation, now: i64) -> RepoResult<Donation>;
    async fn save_donation(&mut self, donation: &Donation) -> RepoResult<Donation>;
    async fn delete_donation(&mut self, id: i64) -> RepoResult<bool>;
}

#[async_trait]
pub trait EventRepository {
    /// Ordered by `starts_at`
    async fn list_events(&mut self) -> RepoResult<Vec<Event>>;
    async fn find_event(&mut self, id: i64) -> RepoResult<Option<Event>>;
    async fn lock_event(&mut self, id: i64) -> RepoResult<Option<Event>>;
    async fn insert_event(&mut self, data: &EventCreate, now: i64) -> RepoResult<Event>;
    async fn update_event(
        &mut self,
        id: i64,
        data: &EventUpdate,
        now: i64,
    ) -> RepoResult<Option<Event>>;
    async fn set_event_registrations(&mut self, id: i64, count: i32, now: i64) -> RepoResult<()>;
    /// Removes the event and its registrations
    async fn delete_event(&mut self, id: i64) -> RepoResult<bool>;
}

#[async_trait]
pub trait RegistrationRepository {
    /// Ordered by `registration_date`, then id
    async fn list_registrations(&mut self, event_id: i64) -> RepoResult<Vec<EventRegistration>>;
    async fn find_registration(
        &mut self,
        event_id: i64,
        registration_id: i64,
    ) -> RepoResult<Option<EventRegistration>>;
    async fn find_member_registration(
        &mut self,
        event_id: i64,
        member_id: i64,
    ) -> RepoResult<Option<EventRegistration>>;
    /// Registrations holding a slot (`confirmed` or `attended`)
    async fn count_slot_holders(&mut self, event_id: i64) -> RepoResult<i64>;
    /// Earliest pending registration (FIFO), tie broken by id
    async fn oldest_pending(&mut self, event_id: i64) -> RepoResult<Option<EventRegistration>>;
    /// `Duplicate` when the member already has a registration for the event
    async fn insert_registration(&mut self, data: &NewRegistration)
    -> RepoResult<EventRegistration>;
    async fn set_registration_status(
        &mut self,
        id: i64,
        status: RegistrationStatus,
        now: i64,
    ) -> RepoResult<EventRegistration>;
    async fn delete_registration(&mut self, id: i64) -> RepoResult<bool>;
}

#[async_trait]
pub trait CommunicationRepository {
    /// Newest first
    async fn list_communications(&mut self) -> RepoResult<Vec<Communication>>;
    async fn find_communication(&mut self, id: i64) -> RepoResult<Option<Communication>>;
    async fn lock_communication(&mut self, id: i64) -> RepoResult<Option<Communication>>;
    async fn insert_communication(
        &mut self,
        data: &NewCommunication,
        now: i64,
    ) -> RepoResult<Communication>;
    async fn set_total_recipients(&mut self, id: i64, total: i32, now: i64) -> RepoResult<()>;
    async fn mark_communication_sent(&mut self, id: i64, now: i64) -> RepoResult<Communication>;
    /// Removes the communication and its recipient rows
    async fn delete_communication(&mut self, id: i64) -> RepoResult<bool>;
    async fn count_recipients(&mut self, communication_id: i64) -> RepoResult<i64>;
    /// Returns the number of rows inserted
    async fn insert_recipients(
        &mut self,
        communication_id: i64,
        member_ids: &[i64],
    ) -> RepoResult<usize>;
    /// Ordered by member id
    async fn list_recipients(
        &mut self,
        communication_id: i64,
    ) -> RepoResult<Vec<CommunicationRecipient>>;
    async fn find_recipient(
        &mut self,
        communication_id: i64,
        member_id: i64,
    ) -> RepoResult<Option<CommunicationRecipient>>;
    /// Persist the delivery and engagement flags of a recipient row
    async fn save_recipient(&mut self, recipient: &CommunicationRecipient) -> RepoResult<()>;
}

#[async_trait]
pub trait AutomationRepository {
    async fn list_automations(&mut self) -> RepoResult<Vec<Automation>>;
    async fn find_automation(&mut self, id: i64) -> RepoResult<Option<Automation>>;
    async fn insert_automation(&mut self, data: &NewAutomation, now: i64)
    -> RepoResult<Automation>;
    async fn update_automation(
        &mut self,
        id: i64,
        data: &AutomationUpdate,
        now: i64,
    ) -> RepoResult<Option<Automation>>;
    async fn delete_automation(&mut self, id: i64) -> RepoResult<bool>;
    async fn active_automations_for(&mut self, trigger: TriggerType) -> RepoResult<Vec<Automation>>;
    /// `run_count += 1`, `last_run = now`
    async fn record_automation_run(&mut self, id: i64, now: i64) -> RepoResult<Automation>;
    async fn insert_automation_log(
        &mut self,
        data: &NewAutomationLog,
        now: i64,
    ) -> RepoResult<AutomationLog>;
    /// Newest first
    async fn list_automation_logs(&mut self, automation_id: i64) -> RepoResult<Vec<AutomationLog>>;
}

#[async_trait]
pub trait ActivityRepository {
    async fn insert_activity(&mut self, data: &NewActivity, now: i64)
    -> RepoResult<MemberActivity>;
    /// Newest first
    async fn list_activities(&mut self, member_id: i64) -> RepoResult<Vec<MemberActivity>>;
}

#[async_trait]
pub trait ReportRepository {
    /// Aggregates for the dashboard; zeros when there is no data
    async fn dashboard_summary(
        &mut self,
        now: i64,
        month_start: NaiveDate,
    ) -> RepoResult<DashboardSummary>;
}
