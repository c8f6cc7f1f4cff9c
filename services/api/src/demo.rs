use crate::infra::InMemoryEngagementStore;
use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use clap::Args;
use std::sync::Arc;
use studio_engagement::engagement::badges::AchievementService;
use studio_engagement::engagement::clients::{
    ActivitySnapshot, ClientId, SessionRecord, SessionStatus, TenantId,
};
use studio_engagement::engagement::referrals::{QualificationEvent, ReferralService};
use studio_engagement::error::AppError;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Tenant identifier used for the walkthrough
    #[arg(long, default_value = "studio-demo")]
    pub(crate) tenant: String,
    /// Override the reporting date (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Skip the referral portion of the demo
    #[arg(long)]
    pub(crate) skip_referral: bool,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        tenant,
        today,
        skip_referral,
    } = args;

    let tenant = TenantId(tenant);
    let today = today.unwrap_or_else(|| Local::now().date_naive());

    println!("Studio engagement demo (tenant {})", tenant.0);

    let store = Arc::new(InMemoryEngagementStore::default());
    let achievements = AchievementService::new(store.clone(), store.clone());
    let referrals = ReferralService::new(store.clone(), store.clone());

    let seeded = achievements.seed_default_badges(&tenant)?;
    println!("Seeded {seeded} canonical badges");

    seed_demo_clients(&store, &tenant, today);

    println!("\nBadge sweep");
    let report = achievements.check_all_clients(&tenant)?;
    println!(
        "- {} clients checked | {} badges awarded | {} failures",
        report.checked, report.awarded, report.failed
    );
    for detail in &report.details {
        if let Some(error) = &detail.error {
            println!("  - {}: check failed ({error})", detail.client_id.0);
        } else if detail.badges.is_empty() {
            println!("  - {}: no new badges", detail.client_id.0);
        } else {
            println!("  - {}: {}", detail.client_id.0, detail.badges.join(", "));
        }
    }

    let rerun = achievements.check_all_clients(&tenant)?;
    println!(
        "Second sweep awards {} badges (grants are idempotent)",
        rerun.awarded
    );

    if skip_referral {
        return Ok(());
    }

    println!("\nReferral walkthrough");
    let settings = referrals.get_settings(&tenant)?;
    println!(
        "- Referrer reward: {} | referred reward: {}",
        settings.referrer_reward.description, settings.referred_reward.description
    );

    let referrer = ClientId("klient-jana".to_string());
    let referred = ClientId("klient-eva".to_string());

    let record = referrals.open_referral(&tenant, &referrer)?;
    println!(
        "- Opened referral {} from {} -> status {}",
        record.id.0,
        referrer.0,
        record.status.label()
    );

    referrals.mark_signed_up(&record.id, &referred)?;
    println!("- {} signed up through the code", referred.0);

    let qualified = referrals.check_and_qualify(&record.id, QualificationEvent::FirstSession)?;
    println!("- First completed session reported -> qualified: {qualified}");

    let applied = referrals.apply_rewards(&record.id)?;
    if let Some(reward) = &applied.referrer_reward {
        println!(
            "- Referrer credited: {} (balance now {})",
            reward.description,
            store.credits_of(&referrer)
        );
    }
    if let Some(reward) = &applied.referred_reward {
        let notes = store.credit_notes_for(&referred);
        println!(
            "- Referred client receives: {} ({} open discount note)",
            reward.description,
            notes.len()
        );
    }

    let stats = referrals.stats(&tenant)?;
    println!(
        "- Program stats: {} referrals | {:.0}% conversion",
        stats.total,
        stats.conversion_rate * 100.0
    );
    for top in &stats.top_referrers {
        println!(
            "  - {}: {} referrals, {} converted",
            top.referrer_id.0, top.total, top.converted
        );
    }

    Ok(())
}

fn seed_demo_clients(store: &InMemoryEngagementStore, tenant: &TenantId, today: NaiveDate) {
    // Regular attendee: morning sessions spread over the past five weeks,
    // enough for the first-session, ten-session and streak badges.
    let jana_sessions: Vec<SessionRecord> = (0..10i64)
        .map(|index| completed_session(today - Duration::days(index * 3 + 1), 7))
        .collect();
    store.upsert_client(
        tenant,
        ClientId("klient-jana".to_string()),
        ActivitySnapshot {
            sessions: jana_sessions,
            measurement_count: 2,
            ..ActivitySnapshot::default()
        },
    );

    // Newer client chasing a weight goal, two sessions in.
    store.upsert_client(
        tenant,
        ClientId("klient-petr".to_string()),
        ActivitySnapshot {
            sessions: vec![
                completed_session(today - Duration::days(4), 18),
                completed_session(today - Duration::days(11), 18),
            ],
            measurement_count: 6,
            current_weight: Some(82.0),
            target_weight: Some(83.0),
            ..ActivitySnapshot::default()
        },
    );

    // Signed up but has not attended yet.
    store.upsert_client(
        tenant,
        ClientId("klient-eva".to_string()),
        ActivitySnapshot {
            sessions: vec![SessionRecord {
                status: SessionStatus::Scheduled,
                scheduled_at: session_time(today + Duration::days(2), 17),
            }],
            ..ActivitySnapshot::default()
        },
    );
}

fn completed_session(date: NaiveDate, hour: u32) -> SessionRecord {
    SessionRecord {
        status: SessionStatus::Completed,
        scheduled_at: session_time(date, hour),
    }
}

fn session_time(date: NaiveDate, hour: u32) -> NaiveDateTime {
    date.and_hms_opt(hour, 0, 0).expect("valid session time")
}
