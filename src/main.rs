use chrono::Utc;
use cohost_algo::config::{LoggingSettings, Settings};
use cohost_algo::services::{MatchReport, PoolGenerator};
use cohost_algo::{BatchMatcher, Entity, Matcher};
use rand::{rngs::StdRng, SeedableRng};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Logs go to stderr so the report owns stdout.
fn init_logging(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    match settings.format.as_str() {
        "json" => subscriber.json().init(),
        "pretty" => subscriber.pretty().init(),
        _ => subscriber.compact().init(),
    }
}

fn main() {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        panic!("Configuration error: {}", e);
    });

    init_logging(&settings.logging);

    info!("Starting Cohost Algo match demo...");

    let demo = &settings.demo;
    let now = Utc::now().timestamp();
    let mut rng = match demo.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let pool = PoolGenerator::new(&mut rng, now).generate_pool(demo.pool_size);
    info!(pool_size = pool.len(), "Candidate pool generated");

    let seeker = Entity {
        mic_count: demo.mic_count,
        audience_count: demo.audience_count,
        wait_seconds: demo.wait_seconds,
        ..Entity::new(demo.seeker_id.clone())
    };

    let matcher = Matcher::new(settings.matching.to_match_config());
    info!("Matcher initialized with config: {:?}", matcher.config());

    let result = matcher.match_detailed_with(&seeker, &pool, &demo.seeker_user_id, now, &mut rng);
    let report = MatchReport::build(&seeker, &result, demo.top_n);

    if demo.output == "json" {
        match report.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to serialize match report: {}", e),
        }
    } else {
        println!("{}", report);
    }

    if demo.batch_seekers > 0 {
        run_batch_demo(&settings, matcher, &pool, now, &mut rng);
    }
}

/// Match a batch of generated seekers against the same pool
fn run_batch_demo(settings: &Settings, matcher: Matcher, pool: &[Entity], now: i64, rng: &mut StdRng) {
    let count = settings.demo.batch_seekers;

    let seekers: Vec<Entity> = PoolGenerator::new(&mut *rng, now)
        .generate_pool(count)
        .into_iter()
        .enumerate()
        .map(|(i, mut seeker)| {
            seeker.id = format!("seeker_{:03}", i + 1);
            seeker
        })
        .collect();
    let seeker_refs: Vec<Option<&Entity>> = seekers.iter().map(Some).collect();
    let seeker_ids: Vec<String> = (0..count).map(|i| format!("user{}", i)).collect();

    let batch = BatchMatcher::new(matcher, settings.batch.parallel);
    let result = match settings.batch.seed {
        Some(seed) => batch.batch_match_seeded(&seeker_refs, pool, &seeker_ids, now, seed),
        None => batch.batch_match(&seeker_refs, pool, &seeker_ids),
    };

    match result {
        Ok(matches) => {
            let mut pairs: Vec<_> = matches.iter().collect();
            pairs.sort_by(|a, b| a.0.cmp(b.0));
            for (seeker_id, candidate) in pairs {
                info!(seeker = %seeker_id, candidate = %candidate.id, "Batch pairing");
            }
            info!(
                seekers = count,
                matched = matches.len(),
                parallel = batch.is_parallel(),
                "Batch demo finished"
            );
        }
        Err(e) => error!("Batch match failed: {}", e),
    }
}
