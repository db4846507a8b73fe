//! Client tuning knobs. Defaults match the live server's expectations.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Render/update tick; 60 Hz.
    pub frame_interval: Duration,
    pub ping_interval: Duration,
    pub reconnect_delay: Duration,
    /// `None` reconnects forever.
    pub max_reconnects: Option<u32>,

    /// Minimum spacing between upstream `move` reports (20 per second).
    pub move_send_interval: Duration,
    /// Joystick offset → world units per frame.
    pub move_speed: f32,
    pub joystick_deadzone: f32,
    pub joystick_max_distance: f32,

    pub default_attack_cooldown: Duration,

    pub portal_cooldown: Duration,
    pub portal_poll_interval: Duration,
    pub portal_radius: f32,
    pub portal_banner_lifetime: Duration,
    pub roster_request_delay: Duration,

    pub auth_delay_after_connect: Duration,
    pub auth_delay_after_init: Duration,

    pub chat_history: usize,
    pub chat_lifetime: Duration,

    pub player_name: Option<String>,
    pub auth_token: Option<String>,
}

impl ClientConfig {
    pub fn with_frame_rate(mut self, frames_per_second: u32) -> Self {
        let fps = frames_per_second.max(1);
        self.frame_interval = Duration::from_micros(1_000_000 / u64::from(fps));
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_micros(16_667),
            ping_interval: Duration::from_millis(2000),
            reconnect_delay: Duration::from_millis(3000),
            max_reconnects: None,
            move_send_interval: Duration::from_millis(50),
            move_speed: 0.05,
            joystick_deadzone: 3.0,
            joystick_max_distance: 45.0,
            default_attack_cooldown: Duration::from_millis(1000),
            portal_cooldown: Duration::from_millis(3000),
            portal_poll_interval: Duration::from_millis(300),
            portal_radius: 50.0,
            portal_banner_lifetime: Duration::from_millis(1300),
            roster_request_delay: Duration::from_millis(100),
            auth_delay_after_connect: Duration::from_millis(200),
            auth_delay_after_init: Duration::from_millis(100),
            chat_history: 10,
            chat_lifetime: Duration::from_secs(8),
            player_name: None,
            auth_token: None,
        }
    }
}
