//! Aggregation pipelines sent to the Funifier `/database/*/aggregate` routes.
//!
//! Achievement types used below: `2` is a lottery ticket purchase, `5` is a
//! lottery win.

use crate::api::routes;
use crate::error::Result;
use crate::query::template::{define_time_range, Template};

/// Attribute holding the creation timestamp of a lottery
pub const LOTTERY_TIME_ATTRIBUTE: &str = "created";

pub const COUNT_LOTTERY_PARTICIPANTS: Template = Template::new(
    r##"
    [
        {
            "$match": {
                "type": 2,
                "item": "#ticket_uid#"
            }
        },
        {
            "$count": "player"
        },
        {
            "$project": {
                "count": "$player"
            }
        }
    ]
    "##,
);

pub const LOTTERY_WINNERS_WITH_ADDRESS: Template = Template::new(
    r##"
    [
        {
            "$match": {
                "type": 5,
                "item": "#lottery_uid#"
            }
        },
        {
            "$lookup": {
                "from": "achievement",
                "let": {
                    "playerUID": "$player"
                },
                "pipeline": [
                    {
                        "$match": {
                            "$expr": {
                                "$and": [
                                    { "$eq": ["$type", 2] },
                                    { "$eq": ["$item", "#ticket_uid#"] },
                                    { "$eq": ["$player", "$$playerUID"] }
                                ]
                            }
                        }
                    },
                    {
                        "$group": {
                            "_id": {
                                "playerUID": "$player",
                                "firstName": "$extra.firstName",
                                "lastName": "$extra.lastName",
                                "phone": "$extra.phone",
                                "dateOfBirth": "$extra.dateOfBirth",
                                "street": "$extra.street",
                                "city": "$extra.city",
                                "zip": "$extra.zip",
                                "tos_accepted": "$extra.tos_accepted",
                                "privacy_accepted": "$extra.privacy_accepted"
                            }
                        }
                    }
                ],
                "as": "joinedData"
            }
        },
        {
            "$project": {
                "player": 1,
                "total": 1,
                "lotteryUID": "$item",
                "time": 1,
                "ticketUID": "$extra.ticket",
                "firstname": { "$arrayElemAt": ["$joinedData._id.firstName", 0] },
                "lastName": { "$arrayElemAt": ["$joinedData._id.lastName", 0] },
                "phone": { "$arrayElemAt": ["$joinedData._id.phone", 0] },
                "dateOfBirth": { "$arrayElemAt": ["$joinedData._id.dateOfBirth", 0] },
                "street": { "$arrayElemAt": ["$joinedData._id.street", 0] },
                "city": { "$arrayElemAt": ["$joinedData._id.city", 0] },
                "zip": { "$arrayElemAt": ["$joinedData._id.zip", 0] },
                "tos_accepted": { "$arrayElemAt": ["$joinedData._id.tos_accepted", 0] },
                "privacy_accepted": { "$arrayElemAt": ["$joinedData._id.privacy_accepted", 0] }
            }
        }
    ]
    "##,
);

pub const COUNT_LOTTERY_WINNERS: Template = Template::new(
    r##"
    [
        {
            "$match": {
                "type": 5,
                "item": "#lottery_uid#"#timeperiod#
            }
        },
        {
            "$count": "player"
        },
        {
            "$project": {
                "count": "$player"
            }
        }
    ]
    "##,
);

pub const LOTTERY_PARTICIPANTS: Template = Template::new(
    r##"
    [
        {
            "$match": {
                "type": 2,
                "item": "#ticket_uid#"#timeperiod#
            }
        },
        {
            "$group": {
                "_id": "$player",
                "tickets": { "$sum": "$total" },
                "firstname": { "$first": { "$ifNull": ["$extra.firstName", ""] } },
                "lastname": { "$first": { "$ifNull": ["$extra.lastName", ""] } },
                "tos_accepted": { "$first": { "$ifNull": ["$extra.tos_accepted", false] } },
                "privacy_accepted": { "$first": { "$ifNull": ["$extra.privacy_accepted", false] } }
            }
        },
        {
            "$project": {
                "_id": 0,
                "player": "$_id",
                "tickets": 1,
                "firstname": 1,
                "lastname": 1,
                "tos_accepted": 1,
                "privacy_accepted": 1
            }
        }
    ]
    "##,
);

pub const COUNT_PLAYER_TICKETS: Template = Template::new(
    r##"
    [
        {
            "$match": {
                "type": 2,
                "item": "#ticket_uid#",
                "player": "#player_uid#"
            }
        },
        {
            "$group": {
                "_id": "$player",
                "count": { "$sum": "$total" }
            }
        },
        {
            "$project": {
                "_id": 0,
                "count": 1
            }
        }
    ]
    "##,
);

pub const LOTTERY_UIDS_BY_LAST_N_ENTRIES: Template = Template::new(
    r##"
    [
        {
            "$sort": { "created": -1 }
        },
        {
            "$limit": #n_entries#
        },
        {
            "$project": {
                "_id": 0,
                "lotteryUID": "$_id",
                "title": 1,
                "created": 1
            }
        }
    ]
    "##,
);

/// The fixed set of template-driven queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedQuery {
    CountLotteryParticipants,
    LotteryWinnersWithAddress,
    CountLotteryWinners,
    LotteryParticipants,
    CountPlayerTickets,
    LotteryUidsByLastEntries,
}

impl NamedQuery {
    pub const ALL: [NamedQuery; 6] = [
        NamedQuery::CountLotteryParticipants,
        NamedQuery::LotteryWinnersWithAddress,
        NamedQuery::CountLotteryWinners,
        NamedQuery::LotteryParticipants,
        NamedQuery::CountPlayerTickets,
        NamedQuery::LotteryUidsByLastEntries,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NamedQuery::CountLotteryParticipants => "count_lottery_participants",
            NamedQuery::LotteryWinnersWithAddress => "get_lottery_winners_with_address",
            NamedQuery::CountLotteryWinners => "count_lottery_winners",
            NamedQuery::LotteryParticipants => "get_lottery_participants",
            NamedQuery::CountPlayerTickets => "count_player_tickets",
            NamedQuery::LotteryUidsByLastEntries => "get_lottery_uids_by_last_n_entries",
        }
    }

    pub fn template(self) -> Template {
        match self {
            NamedQuery::CountLotteryParticipants => COUNT_LOTTERY_PARTICIPANTS,
            NamedQuery::LotteryWinnersWithAddress => LOTTERY_WINNERS_WITH_ADDRESS,
            NamedQuery::CountLotteryWinners => COUNT_LOTTERY_WINNERS,
            NamedQuery::LotteryParticipants => LOTTERY_PARTICIPANTS,
            NamedQuery::CountPlayerTickets => COUNT_PLAYER_TICKETS,
            NamedQuery::LotteryUidsByLastEntries => LOTTERY_UIDS_BY_LAST_N_ENTRIES,
        }
    }

    pub fn route(self) -> &'static str {
        match self {
            NamedQuery::LotteryUidsByLastEntries => routes::DB_LOTTERY_AGGR,
            _ => routes::DB_ACHIEVEMENT_AGGR,
        }
    }
}

/// Lotteries created between two `YYYY-MM-DD` dates
pub fn lotteries_in_date_range(from_date: &str, to_date: &str) -> Result<String> {
    let range = define_time_range(from_date, to_date, LOTTERY_TIME_ATTRIBUTE)?;
    Ok(format!(
        r#"[{{"$match": {{{}}}}}, {{"$project": {{"_id": 0, "lotteryUID": "$_id", "title": 1, "created": 1}}}}]"#,
        range
    ))
}
