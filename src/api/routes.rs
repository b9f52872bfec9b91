//! Funifier API routes, relative to `/{version}`

pub const ACTION: &str = "/action";
pub const ACTION_LOG: &str = "/action/log";
pub const ACTION_LOG_BULK: &str = "/action/log/bulk";
pub const LEVEL: &str = "/level";
pub const CHALLENGE: &str = "/challenge";
pub const DB_ACTION_AGGR: &str = "/database/action/aggregate";
pub const DB_ACTION_LOG_AGGR: &str = "/database/action_log/aggregate?strict=true";
pub const DB_ACHIEVEMENT_AGGR: &str = "/database/achievement/aggregate?strict=true";
pub const DB_PLAYER_AGGR: &str = "/database/player/aggregate?strict=true";
pub const DB_PLAYER_STATUS: &str = "/player/status";
pub const DB_PLAYER_ATTRIBUTE: &str = "/player/attribute";
pub const DB_MYSTERY_BOX_LOG_AGGR: &str = "/database/mystery_box_log/aggregate?strict=true";
pub const DB_MYSTERY_BOX_AGGR: &str = "/database/mystery_box/aggregate?strict=true";
pub const DB_LOTTERY_AGGR: &str = "/database/lottery/aggregate?strict=true";
pub const DB_LOTTERY_TICKETS_AGGR: &str = "/database/lottery_ticket/aggregate?strict=true";
pub const DB_VIRTUAL_GOODS_AGGR: &str = "/database/catalog_item/aggregate?strict=true";
