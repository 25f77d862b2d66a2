use std::collections::{HashMap, HashSet};

use super::activity::{Activity, Member};

/// Count game activities across a channel's occupants.
///
/// Each member contributes one count per distinct game it is playing.
pub fn count_games(members: &[Member]) -> HashMap<&Activity, usize> {
    let mut counts: HashMap<&Activity, usize> = HashMap::new();
    for member in members {
        let distinct: HashSet<&Activity> = member.activities.iter().filter(|a| a.is_game()).collect();
        for activity in distinct {
            *counts.entry(activity).or_insert(0) += 1;
        }
    }
    counts
}

/// Pick the game a strict plurality of occupants is playing.
///
/// Returns `None` when nobody is playing anything or when two or more games
/// share the highest count. Ties are never broken.
pub fn resolve_dominant_activity(members: &[Member]) -> Option<Activity> {
    let counts = count_games(members);

    let mut best: Option<(&Activity, usize)> = None;
    let mut runner_up = 0usize;

    for (activity, count) in counts {
        match best {
            Some((_, top)) if count > top => {
                runner_up = top;
                best = Some((activity, count));
            }
            Some(_) => runner_up = runner_up.max(count),
            None => best = Some((activity, count)),
        }
    }

    match best {
        Some((activity, top)) if top > runner_up => Some(activity.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::activity::ActivityKind;

    fn player(id: &str, games: &[&str]) -> Member {
        games
            .iter()
            .fold(Member::new(id, id), |m, g| m.with_activity(Activity::playing(*g)))
    }

    #[test]
    fn test_empty_channel_has_no_dominant_game() {
        assert_eq!(resolve_dominant_activity(&[]), None);
    }

    #[test]
    fn test_nobody_playing() {
        let members = vec![Member::new("a", "alice"), Member::new("b", "bob")];
        assert_eq!(resolve_dominant_activity(&members), None);
    }

    #[test]
    fn test_strict_plurality_wins() {
        let members = vec![
            player("a", &["Halo"]),
            player("b", &["Halo"]),
            player("c", &["Chess"]),
        ];
        assert_eq!(
            resolve_dominant_activity(&members),
            Some(Activity::playing("Halo"))
        );
    }

    #[test]
    fn test_tie_for_first_yields_none() {
        let members = vec![player("a", &["Halo"]), player("b", &["Chess"])];
        assert_eq!(resolve_dominant_activity(&members), None);

        let members = vec![
            player("a", &["Halo"]),
            player("b", &["Halo"]),
            player("c", &["Chess"]),
            player("d", &["Chess"]),
            player("e", &["Tetris"]),
        ];
        assert_eq!(resolve_dominant_activity(&members), None);
    }

    #[test]
    fn test_tie_below_the_top_does_not_matter() {
        let members = vec![
            player("a", &["Halo"]),
            player("b", &["Halo"]),
            player("c", &["Halo"]),
            player("d", &["Chess"]),
            player("e", &["Tetris"]),
        ];
        assert_eq!(
            resolve_dominant_activity(&members),
            Some(Activity::playing("Halo"))
        );
    }

    #[test]
    fn test_solo_player_is_dominant() {
        let members = vec![player("a", &["Minecraft"])];
        assert_eq!(
            resolve_dominant_activity(&members),
            Some(Activity::playing("Minecraft"))
        );
    }

    #[test]
    fn test_non_game_activities_are_ignored() {
        let listening = Member::new("a", "alice")
            .with_activity(Activity::new("Spotify", ActivityKind::Listening));
        let streaming = Member::new("b", "bob")
            .with_activity(Activity::new("Spotify", ActivityKind::Streaming));
        let gamer = player("c", &["Chess"]);
        assert_eq!(
            resolve_dominant_activity(&[listening, streaming, gamer]),
            Some(Activity::playing("Chess"))
        );
    }

    #[test]
    fn test_member_with_several_games_counts_once_per_game() {
        // alice: Halo + Chess, bob: Chess  =>  Chess 2, Halo 1
        let members = vec![player("a", &["Halo", "Chess"]), player("b", &["Chess"])];
        let counts = count_games(&members);
        assert_eq!(counts[&Activity::playing("Chess")], 2);
        assert_eq!(counts[&Activity::playing("Halo")], 1);
        assert_eq!(
            resolve_dominant_activity(&members),
            Some(Activity::playing("Chess"))
        );
    }

    #[test]
    fn test_same_name_different_details_counts_together() {
        let mut ranked = Activity::playing("Halo");
        ranked.details = Some("Ranked".into());
        let mut campaign = Activity::playing("Halo");
        campaign.details = Some("Campaign".into());
        let members = vec![
            Member::new("a", "alice").with_activity(ranked),
            Member::new("b", "bob").with_activity(campaign),
            player("c", &["Chess"]),
        ];
        assert_eq!(
            resolve_dominant_activity(&members).map(|a| a.name),
            Some("Halo".to_string())
        );
    }

    #[test]
    fn test_result_is_independent_of_member_order() {
        let mut members = vec![
            player("a", &["Halo"]),
            player("b", &["Chess"]),
            player("c", &["Halo"]),
            player("d", &["Tetris", "Chess"]),
            player("e", &["Halo"]),
        ];
        let expected = resolve_dominant_activity(&members);
        assert_eq!(expected, Some(Activity::playing("Halo")));
        for _ in 0..members.len() {
            members.rotate_left(1);
            assert_eq!(resolve_dominant_activity(&members), expected);
        }
        members.reverse();
        assert_eq!(resolve_dominant_activity(&members), expected);
    }
}
