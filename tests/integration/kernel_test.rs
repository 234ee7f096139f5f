//! Integration tests for the orchestration kernel.
//!
//! These tests are implemented in:
//! `crates/corral-runtime/tests/kernel_test.rs`
//!
//! Covered scenarios:
//! - `distinct_ids_are_all_retrievable`: Registry keeps every distinct id
//! - `duplicate_id_fails_creation`: Id collisions fail instead of overwriting
//! - `every_started_process_completes`: Started processes reach `Completed`
//! - `panicking_action_is_contained`: A crashing action only fails its own process
//! - `stop_all_freezes_running_processes`: Stopped processes stay stopped
//! - `monitor_runs_beside_simulator`: Monitor and simulator interleave safely
//! - `monitor_until_honours_stop`: Monitor halts on its stop signal
//! - `web_server_and_database_scenario`: Full create/start/message/monitor/stop run
