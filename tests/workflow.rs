use std::{fs, path::PathBuf, process::Command};

#[test]
fn basic_workflow() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("basic_workflow");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");

    let config_path = test_dir.join("config.toml");
    let config_contents = String::new()
        + "[arena]\n"
        + "radius = 5.0\n"
        + "\n"
        + "[population]\n"
        + "initial_humans = 4\n"
        + "initial_zombies = 1\n"
        + "human_speed = 1.0\n"
        + "zombie_speed = 1.5\n"
        + "\n"
        + "[body]\n"
        + "min_radius = 0.1\n"
        + "max_radius = 0.3\n"
        + "relaxation_time = 0.5\n"
        + "cpm_beta = 0.9\n"
        + "\n"
        + "[infection]\n"
        + "contact_duration = 0.2\n"
        + "probabilities = [ 0.5,]\n"
        + "\n"
        + "[avoidance]\n"
        + "a_human = 30.0\n"
        + "b_human = 1.0\n"
        + "a_zombie = 500.0\n"
        + "b_zombie = 2.0\n"
        + "a_wall = 50.0\n"
        + "b_wall = 1.0\n"
        + "n_humans = 4\n"
        + "n_zombies = 2\n"
        + "\n"
        + "[run]\n"
        + "time_step = 0.05\n"
        + "simulation_time = 3.0\n"
        + "realizations = 2\n"
        + "\n"
        + "[output]\n"
        + "directory = \"output\"\n"
        + "save_snapshots = true\n"
        + "save_positions = true\n"
        + "save_series = true\n"
        + "save_finish_states = true\n"
        + "min_finish_time = 0.0\n";

    fs::write(&config_path, config_contents).expect("failed to write config file");

    fn run_bin(args: &[&str]) {
        let bin = PathBuf::from(env!("CARGO_BIN_EXE_outbreak"));

        let output = Command::new(bin)
            .args(args)
            .output()
            .expect("failed to execute command");

        let stdout_str =
            std::str::from_utf8(&output.stdout).expect("failed to convert stdout to string");
        let stderr_str =
            std::str::from_utf8(&output.stderr).expect("failed to convert stderr to string");

        assert!(
            output.status.success(),
            "failed to run binary with {args:?}\nstdout:\n{stdout_str}\nstderr:\n{stderr_str}\n"
        );
    }

    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    run_bin(&["--sim-dir", test_dir_str, "run"]);

    let out_dir = test_dir.join("output");
    let finish_states = out_dir.join("finish_states_0.5.csv");
    assert!(finish_states.is_file());
    for realization_idx in 0..2 {
        assert!(out_dir.join(format!("realization_0.5_{realization_idx}.csv")).is_file());
        assert!(
            out_dir
                .join(format!("realization_0.5_{realization_idx}_vel.csv"))
                .is_file()
        );
    }

    let contents = fs::read_to_string(&finish_states).expect("failed to read finish states");
    let header = contents.lines().next().expect("finish states file is empty");
    assert_eq!(header, "Id,Time,NumZombies,NumHumans,averageVelocity");

    let positions = fs::read_to_string(out_dir.join("realization_0.5_0.csv"))
        .expect("failed to read positions");
    let header = positions.lines().next().expect("positions file is empty");
    assert_eq!(header, "Time,AgentID,AgentType,PosX,PosY,Radius");

    run_bin(&["--sim-dir", test_dir_str, "clean"]);
    assert!(!finish_states.exists());
    assert!(!out_dir.exists());

    fs::remove_dir_all(&test_dir).ok();
}
