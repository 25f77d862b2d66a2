use std::collections::{BTreeMap, BTreeSet, HashMap};

use anyhow::Result;
use futures_util::stream::{self, StreamExt};
use tracing::{info, warn};

use super::client::{OwnedGame, SteamApi};

/// Result of a library intersection.
#[derive(Debug, Default)]
pub struct CommonGames {
    /// Each requested player and the Steam id it resolved to.
    pub players: Vec<(String, Option<String>)>,
    /// Resolved ids whose libraries could not be read.
    pub hidden_libraries: Vec<String>,
    /// App id to game name (when Steam supplied one), owned by everyone readable.
    pub games: BTreeMap<u32, Option<String>>,
}

/// Resolve every player, fetch every library, and intersect them.
///
/// Requests fan out with at most `concurrency` in flight. A player that can't be
/// resolved or whose library is hidden is left out of the intersection.
pub async fn games_in_common(
    api: &SteamApi,
    players: &[String],
    concurrency: usize,
) -> Result<CommonGames> {
    let concurrency = concurrency.max(1);

    let resolved: Vec<(String, Option<String>)> = stream::iter(players.iter().cloned())
        .map(|player| async move {
            let id = match api.resolve_player(&player).await {
                Ok(id) => id,
                Err(e) => {
                    warn!(%player, error = %e, "failed to resolve player");
                    None
                }
            };
            (player, id)
        })
        .buffered(concurrency)
        .collect()
        .await;

    for (player, id) in &resolved {
        info!(%player, steam_id = id.as_deref().unwrap_or("-"), "resolved player");
    }

    let ids: Vec<String> = resolved.iter().filter_map(|(_, id)| id.clone()).collect();

    let libraries: Vec<(String, Option<Vec<OwnedGame>>)> = stream::iter(ids)
        .map(|id| async move {
            let games = match api.owned_games(&id).await {
                Ok(games) => games,
                Err(e) => {
                    warn!(steam_id = %id, error = %e, "failed to fetch owned games");
                    None
                }
            };
            (id, games)
        })
        .buffered(concurrency)
        .collect()
        .await;

    let mut hidden_libraries = Vec::new();
    let mut readable = Vec::new();
    for (id, games) in libraries {
        match games {
            Some(games) => readable.push(games),
            None => hidden_libraries.push(id),
        }
    }

    let games = intersect_libraries(&readable);
    info!(count = games.len(), "games common to all");

    Ok(CommonGames {
        players: resolved,
        hidden_libraries,
        games,
    })
}

/// App ids present in every library, with the first name seen for each.
pub fn intersect_libraries(libraries: &[Vec<OwnedGame>]) -> BTreeMap<u32, Option<String>> {
    let Some((first, rest)) = libraries.split_first() else {
        return BTreeMap::new();
    };

    let mut common: BTreeSet<u32> = first.iter().map(|g| g.appid).collect();
    for library in rest {
        let owned: BTreeSet<u32> = library.iter().map(|g| g.appid).collect();
        common.retain(|id| owned.contains(id));
    }

    let mut names: HashMap<u32, &str> = HashMap::new();
    for game in libraries.iter().flatten() {
        if let Some(name) = game.name.as_deref() {
            names.entry(game.appid).or_insert(name);
        }
    }

    common
        .into_iter()
        .map(|id| (id, names.get(&id).map(|n| n.to_string())))
        .collect()
}
