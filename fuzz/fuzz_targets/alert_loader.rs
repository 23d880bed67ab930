#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(dir) = std::env::temp_dir().canonicalize() else {
        return;
    };
    let path = dir.join(format!("alertflow-fuzz-{}.json", std::process::id()));
    if std::fs::write(&path, data).is_err() {
        return;
    }

    let Ok(runtime) = tokio::runtime::Builder::new_current_thread().enable_all().build() else {
        return;
    };
    // 손상된 저장소도 패닉 없이 빈 목록이나 일부 알림으로 읽혀야 함
    let alerts = runtime.block_on(alertflow_log_pipeline::load_alerts(&path));
    for alert in &alerts {
        assert!(alert.events().iter().all(|e| !e.raw().is_empty()));
    }
    let _ = std::fs::remove_file(&path);
});
