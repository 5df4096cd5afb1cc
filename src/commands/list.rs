//! `list`: enumerate attached panels

use cadence_transport::list_panels_sync;

use super::CommandResult;

pub fn list(json: bool) -> CommandResult {
    let panels = list_panels_sync()?;

    if json {
        let infos: Vec<_> = panels.iter().map(|p| &p.info).collect();
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(());
    }

    if panels.is_empty() {
        println!("No Cadence panels found");
        return Ok(());
    }

    println!("Cadence panels:");
    for (i, panel) in panels.iter().enumerate() {
        let info = &panel.info;
        let hand = info
            .handedness
            .map(|h| h.to_string())
            .unwrap_or_else(|| "unknown".into());
        println!(
            "  [{}] {} VID={:04X} PID={:04X} {:?} {} hand={} cols={}",
            i,
            info.display_name(),
            info.vid,
            info.pid,
            info.transport_type,
            info.device_path,
            hand,
            info.columns,
        );
    }
    Ok(())
}
