//! Transient effects for presentation. Fire-and-forget: nothing waits on them.

use shared::Position;

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    MonsterDamaged {
        monster_id: String,
        position: Position,
        damage: i64,
    },
    /// `position` is `None` when the damaged player is not in our registry.
    PlayerDamaged {
        player_id: String,
        position: Option<Position>,
        damage: i64,
    },
    ExpGained {
        amount: i64,
        position: Position,
    },
    LevelUp {
        level: Option<i64>,
    },
    AttackSwing {
        target_id: String,
        from: Position,
        to: Position,
    },
    MobAttack {
        mob_id: String,
        target_player_id: String,
        from: Position,
        to: Position,
    },
    PortalUsed {
        portal_id: String,
    },
    BannerDismissed {
        portal_id: String,
    },
    ChatReceived {
        sender: String,
        text: String,
    },
    StatsChanged,
    MapChanged {
        map_id: String,
    },
}
