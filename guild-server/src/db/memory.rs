//! In-memory store
//!
//! A transaction locks the whole store and works on a copy of it; `commit`
//! writes the copy back, dropping the transaction discards it. This gives
//! the same all-or-nothing behaviour as the PostgreSQL backend.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::models::{
    Automation, AutomationLog, AutomationUpdate, Communication, CommunicationRecipient,
    CommunicationStatus, DashboardSummary, Donation, DonationQuery, Event, EventCreate,
    EventRegistration, EventStatus, EventUpdate, Member, MemberActivity, MemberCreate, MemberQuery,
    MemberUpdate, NewActivity, NewAutomation, NewAutomationLog, NewCommunication, NewDonation,
    NewRegistration, RegistrationStatus, SegmentFilter, Tier, TriggerType,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{
    ActivityRepository, AutomationRepository, CommunicationRepository, DonationRepository,
    EventRepository, MemberRepository, RegistrationRepository, RepoError, RepoResult,
    ReportRepository, Store, StoreTx,
};

#[derive(Debug, Clone)]
struct Table<T> {
    next_id: i64,
    rows: BTreeMap<i64, T>,
}

// derived Default would require `T: Default`
impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            rows: BTreeMap::new(),
        }
    }
}

impl<T> Table<T> {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Clone, Default)]
struct MemoryData {
    members: Table<Member>,
    donations: Table<Donation>,
    events: Table<Event>,
    registrations: Table<EventRegistration>,
    communications: Table<Communication>,
    recipients: Table<CommunicationRecipient>,
    automations: Table<Automation>,
    automation_logs: Table<AutomationLog>,
    activities: Table<MemberActivity>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<MemoryData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> RepoResult<Box<dyn StoreTx>> {
        let guard = self.data.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx { guard, working }))
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryData>,
    working: MemoryData,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn commit(self: Box<Self>) -> RepoResult<()> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

fn missing(what: &str, id: i64) -> RepoError {
    RepoError::NotFound(format!("{what} {id}"))
}

#[async_trait]
impl MemberRepository for MemoryTx {
    async fn list_members(&mut self, query: &MemberQuery) -> RepoResult<Vec<Member>> {
        let mut rows: Vec<Member> = self
            .working
            .members
            .rows
            .values()
            .filter(|m| query.matches(m))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            (&a.last_name, &a.first_name, a.id).cmp(&(&b.last_name, &b.first_name, b.id))
        });
        Ok(rows)
    }

    async fn find_member(&mut self, id: i64) -> RepoResult<Option<Member>> {
        Ok(self.working.members.rows.get(&id).cloned())
    }

    async fn lock_member(&mut self, id: i64) -> RepoResult<Option<Member>> {
        self.find_member(id).await
    }

    async fn insert_member(&mut self, data: &MemberCreate, now: i64) -> RepoResult<Member> {
        if self
            .working
            .members
            .rows
            .values()
            .any(|m| m.email.eq_ignore_ascii_case(&data.email))
        {
            return Err(RepoError::Duplicate(format!("email {}", data.email)));
        }
        let id = self.working.members.next_id();
        let member = Member {
            id,
            first_name: data.first_name.clone(),
            last_name: data.last_name.clone(),
            email: data.email.clone(),
            phone: data.phone.clone(),
            tier: Tier::Bronze,
            total_donated: Decimal::ZERO,
            last_donation_date: None,
            email_subscribed: data.email_subscribed,
            newsletter_subscribed: data.newsletter_subscribed,
            notes: data.notes.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.working.members.rows.insert(id, member.clone());
        Ok(member)
    }

    async fn update_member(
        &mut self,
        id: i64,
        data: &MemberUpdate,
        now: i64,
    ) -> RepoResult<Option<Member>> {
        if let Some(email) = &data.email
            && self
                .working
                .members
                .rows
                .values()
                .any(|m| m.id != id && m.email.eq_ignore_ascii_case(email))
        {
            return Err(RepoError::Duplicate(format!("email {email}")));
        }
        let Some(member) = self.working.members.rows.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = &data.first_name {
            member.first_name = v.clone();
        }
        if let Some(v) = &data.last_name {
            member.last_name = v.clone();
        }
        if let Some(v) = &data.email {
            member.email = v.clone();
        }
        if let Some(v) = &data.phone {
            member.phone = Some(v.clone());
        }
        if let Some(v) = data.email_subscribed {
            member.email_subscribed = v;
        }
        if let Some(v) = data.newsletter_subscribed {
            member.newsletter_subscribed = v;
        }
        if let Some(v) = &data.notes {
            member.notes = Some(v.clone());
        }
        if let Some(v) = data.is_active {
            member.is_active = v;
        }
        member.updated_at = now;
        Ok(Some(member.clone()))
    }

    async fn update_member_giving(
        &mut self,
        id: i64,
        total_donated: Decimal,
        tier: Tier,
        last_donation_date: Option<NaiveDate>,
        now: i64,
    ) -> RepoResult<()> {
        let member = self
            .working
            .members
            .rows
            .get_mut(&id)
            .ok_or_else(|| missing("Member", id))?;
        member.total_donated = total_donated;
        member.tier = tier;
        member.last_donation_date = last_donation_date;
        member.updated_at = now;
        Ok(())
    }

    async fn deactivate_member(&mut self, id: i64, now: i64) -> RepoResult<bool> {
        match self.working.members.rows.get_mut(&id) {
            Some(member) => {
                member.is_active = false;
                member.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn segment_member_ids(&mut self, filter: &SegmentFilter) -> RepoResult<Vec<i64>> {
        // BTreeMap iteration is already id-ordered
        Ok(self
            .working
            .members
            .rows
            .values()
            .filter(|m| filter.matches(m))
            .map(|m| m.id)
            .collect())
    }
}

#[async_trait]
impl DonationRepository for MemoryTx {
    async fn list_donations(&mut self, query: &DonationQuery) -> RepoResult<Vec<Donation>> {
        let mut rows: Vec<Donation> = self
            .working
            .donations
            .rows
            .values()
            .filter(|d| query.member_id.is_none_or(|id| d.member_id == id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.donation_date, b.id).cmp(&(a.donation_date, a.id)));
        Ok(rows)
    }

    async fn find_donation(&mut self, id: i64) -> RepoResult<Option<Donation>> {
        Ok(self.working.donations.rows.get(&id).cloned())
    }

    async fn lock_donation(&mut self, id: i64) -> RepoResult<Option<Donation>> {
        self.find_donation(id).await
    }

    async fn insert_donation(&mut self, data: &NewDonation, now: i64) -> RepoResult<Donation> {
        if self
            .working
            .donations
            .rows
            .values()
            .any(|d| d.receipt_number == data.receipt_number)
        {
            return Err(RepoError::Duplicate(format!(
                "receipt_number {}",
                data.receipt_number
            )));
        }
        let id = self.working.donations.next_id();
        let donation = Donation {
            id,
            member_id: data.member_id,
            amount: data.amount,
            processing_fee: data.processing_fee,
            net_amount: data.net_amount,
            donation_date: data.donation_date,
            method: data.method,
            designation: data.designation.clone(),
            receipt_number: data.receipt_number.clone(),
            notes: data.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        self.working.donations.rows.insert(id, donation.clone());
        Ok(donation)
    }

    async fn save_donation(&mut self, donation: &Donation) -> RepoResult<Donation> {
        let row = self
            .working
            .donations
            .rows
            .get_mut(&donation.id)
            .ok_or_else(|| missing("Donation", donation.id))?;
        *row = donation.clone();
        Ok(donation.clone())
    }

    async fn delete_donation(&mut self, id: i64) -> RepoResult<bool> {
        Ok(self.working.donations.rows.remove(&id).is_some())
    }
}

#[async_trait]
impl EventRepository for MemoryTx {
    async fn list_events(&mut self) -> RepoResult<Vec<Event>> {
        let mut rows: Vec<Event> = self.working.events.rows.values().cloned().collect();
        rows.sort_by_key(|e| (e.starts_at, e.id));
        Ok(rows)
    }

    async fn find_event(&mut self, id: i64) -> RepoResult<Option<Event>> {
        Ok(self.working.events.rows.get(&id).cloned())
    }

    async fn lock_event(&mut self, id: i64) -> RepoResult<Option<Event>> {
        self.find_event(id).await
    }

    async fn insert_event(&mut self, data: &EventCreate, now: i64) -> RepoResult<Event> {
        let id = self.working.events.next_id();
        let event = Event {
            id,
            title: data.title.clone(),
            description: data.description.clone(),
            location: data.location.clone(),
            status: data.status.unwrap_or(EventStatus::Draft),
            starts_at: data.starts_at,
            ends_at: data.ends_at,
            capacity: data.capacity,
            current_registrations: 0,
            registration_deadline: data.registration_deadline,
            created_at: now,
            updated_at: now,
        };
        self.working.events.rows.insert(id, event.clone());
        Ok(event)
    }

    async fn update_event(
        &mut self,
        id: i64,
        data: &EventUpdate,
        now: i64,
    ) -> RepoResult<Option<Event>> {
        let Some(event) = self.working.events.rows.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = &data.title {
            event.title = v.clone();
        }
        if let Some(v) = &data.description {
            event.description = Some(v.clone());
        }
        if let Some(v) = &data.location {
            event.location = Some(v.clone());
        }
        if let Some(v) = data.status {
            event.status = v;
        }
        if let Some(v) = data.starts_at {
            event.starts_at = v;
        }
        if let Some(v) = data.ends_at {
            event.ends_at = Some(v);
        }
        if let Some(v) = data.capacity {
            event.capacity = v;
        }
        if let Some(v) = data.registration_deadline {
            event.registration_deadline = Some(v);
        }
        event.updated_at = now;
        Ok(Some(event.clone()))
    }

    async fn set_event_registrations(&mut self, id: i64, count: i32, now: i64) -> RepoResult<()> {
        let event = self
            .working
            .events
            .rows
            .get_mut(&id)
            .ok_or_else(|| missing("Event", id))?;
        event.current_registrations = count;
        event.updated_at = now;
        Ok(())
    }

    async fn delete_event(&mut self, id: i64) -> RepoResult<bool> {
        let removed = self.working.events.rows.remove(&id).is_some();
        if removed {
            self.working
                .registrations
                .rows
                .retain(|_, r| r.event_id != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl RegistrationRepository for MemoryTx {
    async fn list_registrations(&mut self, event_id: i64) -> RepoResult<Vec<EventRegistration>> {
        let mut rows: Vec<EventRegistration> = self
            .working
            .registrations
            .rows
            .values()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.registration_date, r.id));
        Ok(rows)
    }

    async fn find_registration(
        &mut self,
        event_id: i64,
        registration_id: i64,
    ) -> RepoResult<Option<EventRegistration>> {
        Ok(self
            .working
            .registrations
            .rows
            .get(&registration_id)
            .filter(|r| r.event_id == event_id)
            .cloned())
    }

    async fn find_member_registration(
        &mut self,
        event_id: i64,
        member_id: i64,
    ) -> RepoResult<Option<EventRegistration>> {
        Ok(self
            .working
            .registrations
            .rows
            .values()
            .find(|r| r.event_id == event_id && r.member_id == member_id)
            .cloned())
    }

    async fn count_slot_holders(&mut self, event_id: i64) -> RepoResult<i64> {
        Ok(self
            .working
            .registrations
            .rows
            .values()
            .filter(|r| {
                r.event_id == event_id
                    && matches!(
                        r.status,
                        RegistrationStatus::Confirmed | RegistrationStatus::Attended
                    )
            })
            .count() as i64)
    }

    async fn oldest_pending(&mut self, event_id: i64) -> RepoResult<Option<EventRegistration>> {
        Ok(self
            .working
            .registrations
            .rows
            .values()
            .filter(|r| r.event_id == event_id && r.status == RegistrationStatus::Pending)
            .min_by_key(|r| (r.registration_date, r.id))
            .cloned())
    }

    async fn insert_registration(
        &mut self,
        data: &NewRegistration,
    ) -> RepoResult<EventRegistration> {
        if self
            .working
            .registrations
            .rows
            .values()
            .any(|r| r.event_id == data.event_id && r.member_id == data.member_id)
        {
            return Err(RepoError::Duplicate(format!(
                "registration for member {} on event {}",
                data.member_id, data.event_id
            )));
        }
        let id = self.working.registrations.next_id();
        let registration = EventRegistration {
            id,
            event_id: data.event_id,
            member_id: data.member_id,
            status: data.status,
            guests: data.guests,
            registration_date: data.registration_date,
            updated_at: data.registration_date,
        };
        self.working
            .registrations
            .rows
            .insert(id, registration.clone());
        Ok(registration)
    }

    async fn set_registration_status(
        &mut self,
        id: i64,
        status: RegistrationStatus,
        now: i64,
    ) -> RepoResult<EventRegistration> {
        let registration = self
            .working
            .registrations
            .rows
            .get_mut(&id)
            .ok_or_else(|| missing("Registration", id))?;
        registration.status = status;
        registration.updated_at = now;
        Ok(registration.clone())
    }

    async fn delete_registration(&mut self, id: i64) -> RepoResult<bool> {
        Ok(self.working.registrations.rows.remove(&id).is_some())
    }
}

#[async_trait]
impl CommunicationRepository for MemoryTx {
    async fn list_communications(&mut self) -> RepoResult<Vec<Communication>> {
        let mut rows: Vec<Communication> =
            self.working.communications.rows.values().cloned().collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(rows)
    }

    async fn find_communication(&mut self, id: i64) -> RepoResult<Option<Communication>> {
        Ok(self.working.communications.rows.get(&id).cloned())
    }

    async fn lock_communication(&mut self, id: i64) -> RepoResult<Option<Communication>> {
        self.find_communication(id).await
    }

    async fn insert_communication(
        &mut self,
        data: &NewCommunication,
        now: i64,
    ) -> RepoResult<Communication> {
        let id = self.working.communications.next_id();
        let communication = Communication {
            id,
            subject: data.subject.clone(),
            body: data.body.clone(),
            channel: data.channel,
            status: data.status,
            recipient_segments: data.recipient_segments.clone(),
            total_recipients: data.total_recipients,
            scheduled_at: data.scheduled_at,
            sent_at: None,
            created_at: now,
            updated_at: now,
        };
        self.working
            .communications
            .rows
            .insert(id, communication.clone());
        Ok(communication)
    }

    async fn set_total_recipients(&mut self, id: i64, total: i32, now: i64) -> RepoResult<()> {
        let communication = self
            .working
            .communications
            .rows
            .get_mut(&id)
            .ok_or_else(|| missing("Communication", id))?;
        communication.total_recipients = total;
        communication.updated_at = now;
        Ok(())
    }

    async fn mark_communication_sent(&mut self, id: i64, now: i64) -> RepoResult<Communication> {
        let communication = self
            .working
            .communications
            .rows
            .get_mut(&id)
            .ok_or_else(|| missing("Communication", id))?;
        communication.status = CommunicationStatus::Sent;
        communication.sent_at = Some(now);
        communication.updated_at = now;
        Ok(communication.clone())
    }

    async fn delete_communication(&mut self, id: i64) -> RepoResult<bool> {
        let removed = self.working.communications.rows.remove(&id).is_some();
        if removed {
            self.working
                .recipients
                .rows
                .retain(|_, r| r.communication_id != id);
        }
        Ok(removed)
    }

    async fn count_recipients(&mut self, communication_id: i64) -> RepoResult<i64> {
        Ok(self
            .working
            .recipients
            .rows
            .values()
            .filter(|r| r.communication_id == communication_id)
            .count() as i64)
    }

    async fn insert_recipients(
        &mut self,
        communication_id: i64,
        member_ids: &[i64],
    ) -> RepoResult<usize> {
        let mut created = 0;
        for &member_id in member_ids {
            let exists = self
                .working
                .recipients
                .rows
                .values()
                .any(|r| r.communication_id == communication_id && r.member_id == member_id);
            if exists {
                continue;
            }
            let id = self.working.recipients.next_id();
            self.working.recipients.rows.insert(
                id,
                CommunicationRecipient {
                    id,
                    communication_id,
                    member_id,
                    delivered: false,
                    opened: false,
                    clicked: false,
                    bounced: false,
                    delivered_at: None,
                    opened_at: None,
                    clicked_at: None,
                },
            );
            created += 1;
        }
        Ok(created)
    }

    async fn list_recipients(
        &mut self,
        communication_id: i64,
    ) -> RepoResult<Vec<CommunicationRecipient>> {
        let mut rows: Vec<CommunicationRecipient> = self
            .working
            .recipients
            .rows
            .values()
            .filter(|r| r.communication_id == communication_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.member_id);
        Ok(rows)
    }

    async fn find_recipient(
        &mut self,
        communication_id: i64,
        member_id: i64,
    ) -> RepoResult<Option<CommunicationRecipient>> {
        Ok(self
            .working
            .recipients
            .rows
            .values()
            .find(|r| r.communication_id == communication_id && r.member_id == member_id)
            .cloned())
    }

    async fn save_recipient(&mut self, recipient: &CommunicationRecipient) -> RepoResult<()> {
        let row = self
            .working
            .recipients
            .rows
            .get_mut(&recipient.id)
            .ok_or_else(|| missing("Recipient", recipient.id))?;
        *row = recipient.clone();
        Ok(())
    }
}

#[async_trait]
impl AutomationRepository for MemoryTx {
    async fn list_automations(&mut self) -> RepoResult<Vec<Automation>> {
        Ok(self.working.automations.rows.values().cloned().collect())
    }

    async fn find_automation(&mut self, id: i64) -> RepoResult<Option<Automation>> {
        Ok(self.working.automations.rows.get(&id).cloned())
    }

    async fn insert_automation(
        &mut self,
        data: &NewAutomation,
        now: i64,
    ) -> RepoResult<Automation> {
        let id = self.working.automations.next_id();
        let automation = Automation {
            id,
            name: data.name.clone(),
            trigger_type: data.trigger_type,
            actions: data.actions.clone(),
            is_active: data.is_active,
            run_count: 0,
            last_run: None,
            created_at: now,
            updated_at: now,
        };
        self.working
            .automations
            .rows
            .insert(id, automation.clone());
        Ok(automation)
    }

    async fn update_automation(
        &mut self,
        id: i64,
        data: &AutomationUpdate,
        now: i64,
    ) -> RepoResult<Option<Automation>> {
        let Some(automation) = self.working.automations.rows.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = &data.name {
            automation.name = v.clone();
        }
        if let Some(v) = &data.actions {
            automation.actions = v.clone();
        }
        if let Some(v) = data.is_active {
            automation.is_active = v;
        }
        automation.updated_at = now;
        Ok(Some(automation.clone()))
    }

    async fn delete_automation(&mut self, id: i64) -> RepoResult<bool> {
        let removed = self.working.automations.rows.remove(&id).is_some();
        if removed {
            self.working
                .automation_logs
                .rows
                .retain(|_, l| l.automation_id != id);
        }
        Ok(removed)
    }

    async fn active_automations_for(
        &mut self,
        trigger: TriggerType,
    ) -> RepoResult<Vec<Automation>> {
        Ok(self
            .working
            .automations
            .rows
            .values()
            .filter(|a| a.is_active && a.trigger_type == trigger)
            .cloned()
            .collect())
    }

    async fn record_automation_run(&mut self, id: i64, now: i64) -> RepoResult<Automation> {
        let automation = self
            .working
            .automations
            .rows
            .get_mut(&id)
            .ok_or_else(|| missing("Automation", id))?;
        automation.run_count += 1;
        automation.last_run = Some(now);
        automation.updated_at = now;
        Ok(automation.clone())
    }

    async fn insert_automation_log(
        &mut self,
        data: &NewAutomationLog,
        now: i64,
    ) -> RepoResult<AutomationLog> {
        let id = self.working.automation_logs.next_id();
        let log = AutomationLog {
            id,
            automation_id: data.automation_id,
            trigger_type: data.trigger_type,
            success: data.success,
            error_message: data.error_message.clone(),
            trigger_data: data.trigger_data,
            created_at: now,
        };
        self.working.automation_logs.rows.insert(id, log.clone());
        Ok(log)
    }

    async fn list_automation_logs(&mut self, automation_id: i64) -> RepoResult<Vec<AutomationLog>> {
        Ok(self
            .working
            .automation_logs
            .rows
            .values()
            .rev()
            .filter(|l| l.automation_id == automation_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ActivityRepository for MemoryTx {
    async fn insert_activity(
        &mut self,
        data: &NewActivity,
        now: i64,
    ) -> RepoResult<MemberActivity> {
        let id = self.working.activities.next_id();
        let activity = MemberActivity {
            id,
            member_id: data.member_id,
            activity_type: data.activity_type,
            description: data.description.clone(),
            activity_value: data.activity_value,
            created_at: now,
        };
        self.working.activities.rows.insert(id, activity.clone());
        Ok(activity)
    }

    async fn list_activities(&mut self, member_id: i64) -> RepoResult<Vec<MemberActivity>> {
        // Newest first; ids increase with insertion order
        Ok(self
            .working
            .activities
            .rows
            .values()
            .rev()
            .filter(|a| a.member_id == member_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ReportRepository for MemoryTx {
    async fn dashboard_summary(
        &mut self,
        now: i64,
        month_start: NaiveDate,
    ) -> RepoResult<DashboardSummary> {
        let data = &self.working;
        let mut tier_counts: Vec<(Tier, i64)> = Vec::new();
        for member in data.members.rows.values().filter(|m| m.is_active) {
            match tier_counts.iter_mut().find(|(t, _)| *t == member.tier) {
                Some((_, n)) => *n += 1,
                None => tier_counts.push((member.tier, 1)),
            }
        }

        Ok(DashboardSummary {
            total_members: data.members.rows.len() as i64,
            active_members: data.members.rows.values().filter(|m| m.is_active).count() as i64,
            total_donations: data.donations.rows.len() as i64,
            total_raised: data.donations.rows.values().map(|d| d.amount).sum(),
            raised_this_month: data
                .donations
                .rows
                .values()
                .filter(|d| d.donation_date >= month_start)
                .map(|d| d.amount)
                .sum(),
            upcoming_events: data
                .events
                .rows
                .values()
                .filter(|e| e.starts_at >= now && e.status.accepts_registrations())
                .count() as i64,
            communications_sent: data
                .communications
                .rows
                .values()
                .filter(|c| c.status == CommunicationStatus::Sent)
                .count() as i64,
            active_automations: data.automations.rows.values().filter(|a| a.is_active).count()
                as i64,
            tiers: Vec::new(),
        }
        .with_tier_counts(&tier_counts))
    }
}
