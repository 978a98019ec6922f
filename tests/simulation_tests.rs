#[cfg(test)]
mod tests {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    use agora_engine::cat_tree::{BinClassifier, NodeCore};
    use agora_engine::classify::{RankAttr, RankClassifier};
    use agora_engine::config::{EntityTypeSpec, RankBinSpec};
    use agora_engine::{AgoraSimulation, FollowModel, SimConfig, SummaryRouter};

    /// Config with every event class silenced; tests enable what they need.
    fn base_config() -> SimConfig {
        let mut config = SimConfig::default();
        config.initial_entities = 0;
        config.output_stdout_summary = false;
        config.rate_add = 0.0;
        config.rate_follow = 0.0;
        config.rate_tweet = 0.0;
        config.rate_retweet = 0.0;
        config.entity_types = vec![EntityTypeSpec {
            name: "Standard".to_string(),
            prob_add: 1.0,
            prob_follow: 1.0,
        }];
        config
    }

    // ========== Growth and Termination ==========

    #[test]
    fn test_trivial_growth_to_capacity() {
        let mut config = base_config();
        config.max_entities = 3;
        config.max_time = 1e9;
        config.rate_add = 1.0;
        let mut sim = AgoraSimulation::new(config, 42).unwrap();
        let end_time = sim.run();

        assert_eq!(sim.n_entities(), 3);
        assert_eq!(sim.stats().n_follows, 0);
        assert_eq!(sim.stats().n_tweets, 0);
        assert_eq!(sim.stats().n_retweets, 0);
        assert!(end_time < 1e9, "should stop on the population ceiling");
    }

    #[test]
    fn test_barabasi_self_seed() {
        let mut config = base_config();
        config.max_entities = 3;
        config.max_time = 1e9;
        config.rate_add = 1.0;
        config.use_barabasi = true;
        let mut sim = AgoraSimulation::new(config, 42).unwrap();
        sim.run();

        assert_eq!(sim.n_entities(), 3);
        // Every created entity follows itself exactly once.
        assert_eq!(sim.stats().n_follows, 3);
        for e in 0..3 {
            assert_eq!(sim.network().follow_i(e, 0), e);
        }
    }

    #[test]
    fn test_capacity_clamp() {
        let mut config = base_config();
        config.max_entities = 100;
        config.max_time = 1e18;
        config.rate_add = 1.0;
        config.use_barabasi = true;
        let mut sim = AgoraSimulation::new(config, 7).unwrap();
        let end_time = sim.run();

        assert_eq!(sim.n_entities(), 100);
        assert_eq!(sim.stats().n_follows, 100);
        assert!(end_time.is_finite());
        sim.network().sanity_check();
    }

    #[test]
    fn test_full_initial_population_terminates_immediately() {
        let mut config = base_config();
        config.max_entities = 50;
        config.initial_entities = 50;
        config.rate_add = 1.0;
        config.rate_follow = 1.0;
        let mut sim = AgoraSimulation::new(config, 3).unwrap();
        let end_time = sim.run();

        assert_eq!(end_time, 0.0);
        assert_eq!(sim.stats().n_steps, 0);
        assert_eq!(sim.n_entities(), 50);
    }

    #[test]
    fn test_zero_add_rate_population_never_grows() {
        let mut config = base_config();
        config.max_entities = 100;
        config.initial_entities = 5;
        config.max_time = 10.0;
        config.rate_follow = 1.0;
        let mut sim = AgoraSimulation::new(config, 4).unwrap();
        sim.run();

        assert_eq!(sim.n_entities(), 5);
        assert!(sim.time() >= 10.0);
    }

    // ========== Deterministic Time Advance ==========

    #[test]
    fn test_deterministic_increment_is_inverse_rate() {
        let mut config = base_config();
        config.max_entities = 10;
        config.use_random_increment = false;
        config.rate_add = 2.0;
        let mut sim = AgoraSimulation::new(config, 1).unwrap();
        sim.step_core();
        assert_eq!(sim.time(), 0.5);
    }

    // ========== Retweet Cascade ==========

    #[test]
    fn test_retweet_record_cascades_through_followers() {
        let mut config = base_config();
        config.max_entities = 10;
        let mut sim = AgoraSimulation::new(config, 12).unwrap();
        let a = sim.create_entity();
        let b = sim.create_entity();
        let c = sim.create_entity();
        sim.follow(b, a);
        sim.follow(c, b);

        sim.tweet(a);
        sim.set_time(100.0);
        let mut relayed = false;
        for _ in 0..300 {
            if sim.retweet(b) {
                relayed = true;
                break;
            }
        }
        assert!(relayed, "entity b never retweeted its followee");

        // c witnessed the record and can relay it while fresh.
        let witnessed = sim.network().entity(c).retweets.most_recent().unwrap();
        assert_eq!(witnessed.original_tweeter, a);
        sim.set_time(2000.0);
        let mut cascaded = false;
        for _ in 0..300 {
            if sim.retweet(c) {
                cascaded = true;
                break;
            }
        }
        assert!(cascaded, "entity c never relayed inside the window");
        assert!(sim.stats().n_retweets >= 2);
    }

    // ========== Preferential Follow Concentration ==========

    #[test]
    fn test_preferential_follow_concentrates_on_top_entities() {
        let mut config = base_config();
        config.max_entities = 1000;
        config.initial_entities = 1000;
        config.max_time = 1e18;
        config.rate_follow = 1.0;
        config.follow_model = FollowModel::Preferential;
        config.follow_slot_capacity = 2048;
        config.follow_ranks = vec![
            RankBinSpec { threshold: 0.0, rate: 1.0 },
            RankBinSpec { threshold: 1.0, rate: 1.0 },
            RankBinSpec { threshold: 2.0, rate: 1.0 },
            RankBinSpec { threshold: 3.0, rate: 1.0 },
            RankBinSpec { threshold: 4.0, rate: 1.0 },
            RankBinSpec { threshold: 5.0, rate: 1.0 },
            RankBinSpec { threshold: 6.0, rate: 1.0 },
            RankBinSpec { threshold: 7.0, rate: 5.0 },
            RankBinSpec { threshold: 8.0, rate: 20.0 },
            RankBinSpec { threshold: f64::INFINITY, rate: 1000.0 },
        ];
        let mut sim = AgoraSimulation::new(config, 99).unwrap();

        let mut steps = 0u64;
        while sim.stats().n_follows < 10_000 && steps < 200_000 {
            sim.step_core();
            steps += 1;
        }
        assert!(
            sim.stats().n_follows >= 10_000,
            "only {} follows in {} steps",
            sim.stats().n_follows,
            steps
        );

        let mut counts: Vec<usize> = (0..1000).map(|e| sim.network().n_followers(e)).collect();
        counts.sort_unstable_by(|a, b| b.cmp(a));
        let top10: usize = counts.iter().take(10).sum();
        let share = top10 as f64 / sim.stats().n_follows as f64;
        assert!(
            share >= 0.6,
            "top-10 share {:.2} below the rich-get-richer floor",
            share
        );
    }

    // ========== Invariants Across a Mixed Run ==========

    #[test]
    fn test_invariants_hold_through_mixed_run() {
        let mut config = base_config();
        config.max_entities = 300;
        config.max_time = 1e18;
        config.initial_entities = 20;
        config.rate_add = 0.5;
        config.rate_follow = 0.05;
        config.rate_tweet = 0.05;
        config.rate_retweet = 0.02;
        config.entity_types = vec![
            EntityTypeSpec { name: "casual".into(), prob_add: 0.7, prob_follow: 0.3 },
            EntityTypeSpec { name: "celebrity".into(), prob_add: 0.3, prob_follow: 0.7 },
        ];
        let mut sim = AgoraSimulation::new(config, 21).unwrap();
        for _ in 0..5000 {
            if sim.n_entities() >= 300 {
                break;
            }
            sim.step_core();
        }

        let n = sim.n_entities();
        assert!(n > 20, "population should have grown");

        // Entity-type member lists partition the population.
        let members: usize = sim.entity_types().iter().map(|t| t.members.len()).sum();
        assert_eq!(members, n);

        // Every entity sits in exactly one follower-rank bin, and that bin
        // matches its current follower count.
        let ranks = sim.follow_ranks();
        assert_eq!(ranks.len(), n);
        let cls = RankClassifier::new(RankAttr::Followers, &sim.config().follow_ranks);
        for e in 0..n as i32 {
            let bin = cls.classify(sim.network(), e);
            let leaf = ranks.bin(bin).expect("classified bin exists");
            assert!(leaf.contains(e), "entity {} missing from bin {}", e, bin);
        }

        // Cached aggregates agree with their recomputed sums.
        assert!(ranks.aggregate_rate_error() < 1e-9);
        assert!(ranks.aggregate_count_consistent());
        assert!(sim.tweet_bank().tree().aggregate_rate_error() < 1e-9);
        sim.network().sanity_check();
    }

    // ========== Determinism ==========

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn bytes(&self) -> Vec<u8> {
            self.0.lock().unwrap().clone()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn summary_stream(seed: u64) -> Vec<u8> {
        let mut config = base_config();
        config.max_entities = 500;
        config.max_time = 60.0;
        config.initial_entities = 10;
        config.rate_add = 1.0;
        config.rate_follow = 0.1;
        config.rate_tweet = 0.1;
        config.rate_retweet = 0.05;
        config.output_stdout_summary = true;
        let buf = SharedBuf::default();
        let mut sim = AgoraSimulation::new(config, seed)
            .unwrap()
            .with_summary(SummaryRouter::new(None, Some(Box::new(buf.clone()))));
        sim.run();
        buf.bytes()
    }

    #[test]
    fn test_identical_seed_identical_summary_stream() {
        let first = summary_stream(1234);
        let second = summary_stream(1234);
        assert!(!first.is_empty(), "no summary rows emitted");
        assert_eq!(first, second, "summary streams diverged for equal seeds");
    }

    #[test]
    fn test_different_seeds_diverge() {
        let first = summary_stream(1);
        let second = summary_stream(2);
        assert_ne!(first, second);
    }

    // ========== Summary Stream Shape ==========

    #[test]
    fn test_summary_rows_are_tab_separated_with_fixed_time() {
        let bytes = summary_stream(5);
        let text = String::from_utf8(bytes).unwrap();
        let mut rows = 0;
        for line in text.lines() {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split_terminator("\t\t").collect();
            assert_eq!(fields.len(), 5, "malformed row: {:?}", line);
            let time_field = fields[0];
            assert!(time_field.parse::<f64>().is_ok());
            let decimals = time_field.split('.').nth(1).unwrap_or("");
            assert_eq!(decimals.len(), 2, "time precision drifted: {}", time_field);
            rows += 1;
        }
        assert!(rows > 10, "expected a stream of rows, got {}", rows);
    }
}
