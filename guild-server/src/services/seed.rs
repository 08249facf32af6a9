//! Demo data
//!
//! Runs only when `SEED_DEMO_DATA=true` and the member table is empty. Every
//! row goes through the regular services so totals, tiers and counters are
//! derived exactly as in production.

use chrono::Duration;
use rust_decimal::Decimal;
use serde_json::json;
use shared::models::{
    AutomationCreate, CommunicationCreate, DonationCreate, DonationMethod, EventCreate, EventStatus,
    MemberCreate, MemberQuery, RegistrationCreate,
};
use shared::util::{now_millis, today};

use crate::error::ServiceResult;
use crate::services::{automation, communication, donation, event, member, registration};
use crate::state::AppState;

const DAY_MS: i64 = 86_400_000;

/// (first, last, email, newsletter, gifts in whole currency units, days ago)
const MEMBERS: &[(&str, &str, &str, bool, &[(i64, i64)])] = &[
    ("Eleanor", "Vance", "eleanor.vance@example.org", true, &[(7_500, 40), (3_000, 5)]),
    ("Marcus", "Hale", "marcus.hale@example.org", false, &[(4_950, 120)]),
    ("Priya", "Raman", "priya.raman@example.org", true, &[(1_200, 20)]),
    ("Tomasz", "Nowak", "tomasz.nowak@example.org", false, &[(250, 200), (150, 12)]),
    ("June", "Okafor", "june.okafor@example.org", true, &[]),
];

/// Insert demo data. Returns `false` when the database already has members.
pub async fn run(state: &AppState) -> ServiceResult<bool> {
    if !member::list(state, &MemberQuery::default()).await?.is_empty() {
        tracing::info!("Database already has members, skipping demo seed");
        return Ok(false);
    }

    let mut member_ids = Vec::with_capacity(MEMBERS.len());
    for &(first, last, email, newsletter, gifts) in MEMBERS {
        let created = member::create(
            state,
            MemberCreate {
                first_name: first.into(),
                last_name: last.into(),
                email: email.into(),
                phone: None,
                email_subscribed: true,
                newsletter_subscribed: newsletter,
                notes: None,
            },
        )
        .await?;
        for &(amount, days_ago) in gifts {
            donation::create(
                state,
                DonationCreate {
                    member_id: Some(created.id),
                    amount: Some(Decimal::from(amount)),
                    processing_fee: None,
                    donation_date: Some(today() - Duration::days(days_ago)),
                    method: Some(DonationMethod::Online),
                    designation: Some("General Fund".into()),
                    notes: None,
                },
            )
            .await?;
        }
        member_ids.push(created.id);
    }

    let now = now_millis();
    let gala = event::create(
        state,
        EventCreate {
            title: "Autumn Gala".into(),
            description: Some("Annual fundraising dinner".into()),
            location: Some("Guild Hall".into()),
            status: Some(EventStatus::Published),
            starts_at: now + 30 * DAY_MS,
            ends_at: Some(now + 30 * DAY_MS + 4 * 3_600_000),
            capacity: Some(3),
            registration_deadline: Some(now + 25 * DAY_MS),
        },
    )
    .await?;
    event::create(
        state,
        EventCreate {
            title: "Volunteer Orientation".into(),
            description: None,
            location: Some("Online".into()),
            status: Some(EventStatus::Draft),
            starts_at: now + 45 * DAY_MS,
            ends_at: None,
            capacity: None,
            registration_deadline: None,
        },
    )
    .await?;
    // four sign-ups for three seats leaves one on the waitlist
    for &member_id in member_ids.iter().take(4) {
        registration::register(
            state,
            gala.id,
            RegistrationCreate {
                member_id: Some(member_id),
                guests: Some(1),
            },
        )
        .await?;
    }

    communication::create(
        state,
        CommunicationCreate {
            subject: "Thank you, major donors".into(),
            body: "Your support keeps the guild going.".into(),
            channel: None,
            recipient_segments: vec!["gold".into(), "platinum".into()],
            scheduled_at: None,
        },
    )
    .await?;

    // automations last, so seeding does not trigger them
    for (name, trigger) in [
        ("Welcome new members", "member_onboarding"),
        ("Thank donors", "donation_acknowledgment"),
        ("Celebrate tier upgrades", "tier_upgrade"),
    ] {
        automation::create(
            state,
            AutomationCreate {
                name: name.into(),
                trigger_type: trigger.into(),
                actions: json!([{ "type": "send_email", "template": trigger }]),
                is_active: Some(true),
            },
        )
        .await?;
    }

    tracing::info!(members = member_ids.len(), "Demo data seeded");
    Ok(true)
}
