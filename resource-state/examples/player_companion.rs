//! A media player and a companion app on one in-process network
//!
//! The player host prints every device command; the companion mirrors the
//! player through a binding and prints what its sink receives.
//!
//! Run with: OCRES_LOG_MODE=development cargo run -p ocres-state --example player_companion

use std::sync::Arc;
use std::time::Duration;

use resource_client::{ClientConfig, LocalNetwork, ResourceClient};
use resource_model::schema::{media_player, BASELINE_INTERFACE};
use resource_model::{PlayerState, ResourceError};
use resource_server::{
    DeviceError, MediaPlayerHandler, Platform, PlatformConfig, PlayerDevice, ResourceProperties,
};
use resource_state::{init_logging_from_env, Binding, ChannelSink, PlayerMachine, SinkEvent};

struct Speaker;

impl PlayerDevice for Speaker {
    fn play(&self, track: Option<&str>) -> Result<(), DeviceError> {
        println!("   [speaker] play {}", track.unwrap_or("<nothing>"));
        Ok(())
    }

    fn pause(&self) -> Result<(), DeviceError> {
        println!("   [speaker] pause");
        Ok(())
    }

    fn resume(&self) -> Result<(), DeviceError> {
        println!("   [speaker] resume");
        Ok(())
    }

    fn stop(&self) -> Result<(), DeviceError> {
        println!("   [speaker] stop");
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging_from_env()?;

    println!("1. Starting player host...");
    let network = LocalNetwork::new();
    let host = Arc::new(Platform::new(PlatformConfig::for_host("living-room"))?);
    host.register(
        "/a/player",
        media_player::RESOURCE_TYPE,
        &[BASELINE_INTERFACE],
        ResourceProperties::default(),
        MediaPlayerHandler::new(
            vec!["Intro".to_string(), "Theme".to_string(), "Outro".to_string()],
            Arc::new(Speaker),
        ),
    )?;
    network.attach(host.clone());
    println!("✓ Hosting {} resource(s)", host.resource_count());

    println!("\n2. Discovering players...");
    let client = Arc::new(ResourceClient::local(network.clone(), ClientConfig::default())?);
    let player = client
        .discover(media_player::RESOURCE_TYPE)
        .next()
        .ok_or_else(|| ResourceError::NotFound("no media player found".to_string()))?;
    println!("✓ Found {}", player.id);

    println!("\n3. Binding companion...");
    let (sink, events) = ChannelSink::<PlayerState>::new();
    let binding = Binding::bind(client.clone(), player, PlayerMachine::new(), Arc::new(sink))?;
    println!("✓ Player is {}", binding.state());

    println!("\n4. Driving the player...");
    binding.play_pause()?;
    binding.play_pause()?;
    binding.select(2)?;
    binding.play_pause()?;
    binding.stop()?;

    // Let the last notifications arrive.
    std::thread::sleep(Duration::from_millis(200));

    println!("\n5. Companion saw:");
    for event in events.try_iter() {
        match event {
            SinkEvent::State { state, title: Some(title) } => println!("   {} ({})", state, title),
            SinkEvent::State { state, title: None } => println!("   {}", state),
            SinkEvent::Attribute { name, value } => println!("   {} = {}", name, value),
        }
    }

    binding.unbind()?;
    client.shutdown();
    host.shutdown();
    println!("\n✓ Done");
    Ok(())
}
