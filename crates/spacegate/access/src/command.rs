//! Moderator chat commands.
//!
//! Two commands are understood, selected by the first whitespace-delimited
//! token of a chat message:
//!
//! - `/teleport <name> me | <x>,<y> | <area> | "<multi word area>"`
//! - `/list`
//!
//! Anything else is ordinary chat and parses to `None`.

use crate::catalog::RegionCatalog;
use crate::error::{AccessError, AccessResult};
use spacegate_types::{PlayerInfo, Point, WorldAction};

const TELEPORT_USAGE: &str = "Usage: /teleport <name> me | <x>,<y> | <area> | \"<area name>\"";

/// Where a teleport command sends its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// The sender's current position.
    Sender,
    Coordinates(Point),
    /// Center of the named region.
    Area(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeratorCommand {
    Teleport {
        target: String,
        destination: Destination,
    },
    List,
}

impl ModeratorCommand {
    /// Parse a chat message. `Ok(None)` means the message is not a command.
    pub fn parse(text: &str) -> AccessResult<Option<Self>> {
        let mut tokens = text.split_whitespace();

        match tokens.next() {
            Some("/list") => Ok(Some(ModeratorCommand::List)),
            Some("/teleport") => {
                let usage = || AccessError::CommandParse(TELEPORT_USAGE.to_string());
                let target = tokens.next().ok_or_else(usage)?;
                let first = tokens.next().ok_or_else(usage)?;

                let destination = if first == "me" {
                    Destination::Sender
                } else if first.starts_with('"') {
                    Destination::Area(quoted_name(text)?)
                } else if looks_like_coordinates(first) {
                    // "x, y" arrives split over two tokens
                    let coordinates: String = std::iter::once(first).chain(tokens).collect();
                    let point = coordinates.parse::<Point>().map_err(|_| {
                        AccessError::CommandParse(format!(
                            "Invalid coordinates '{}': expected <x>,<y>",
                            coordinates
                        ))
                    })?;
                    Destination::Coordinates(point)
                } else {
                    Destination::Area(first.to_string())
                };

                Ok(Some(ModeratorCommand::Teleport {
                    target: target.to_string(),
                    destination,
                }))
            }
            _ => Ok(None),
        }
    }

    /// Turn the command into world actions on behalf of `sender`.
    ///
    /// `players` is the list of currently connected players; teleport targets
    /// are matched against it by exact display name, first match wins.
    pub fn execute(
        &self,
        sender: &PlayerInfo,
        players: &[PlayerInfo],
        catalog: &RegionCatalog,
    ) -> AccessResult<Vec<WorldAction>> {
        match self {
            ModeratorCommand::List => Ok(vec![WorldAction::private_chat(
                sender.id.clone(),
                sender.map.clone(),
                region_listing(catalog),
            )]),
            ModeratorCommand::Teleport {
                target,
                destination,
            } => {
                let player = players
                    .iter()
                    .find(|p| &p.name == target)
                    .ok_or_else(|| AccessError::UnknownTarget {
                        kind: "player",
                        name: target.clone(),
                    })?;

                let (map, position) = match destination {
                    Destination::Sender => (sender.map.clone(), sender.position),
                    Destination::Coordinates(point) => (player.map.clone(), *point),
                    Destination::Area(name) => {
                        let region = catalog.get(name).ok_or_else(|| AccessError::UnknownTarget {
                            kind: "area",
                            name: name.clone(),
                        })?;
                        let map = region.map.clone().unwrap_or_else(|| player.map.clone());
                        (map, region.center())
                    }
                };

                Ok(vec![WorldAction::teleport(player.id.clone(), map, position)])
            }
        }
    }
}

/// Whether a destination token starts an `x,y` pair rather than naming an
/// area such as `Hall,East`.
fn looks_like_coordinates(token: &str) -> bool {
    token
        .split_once(',')
        .map(|(x, _)| x.trim().parse::<i64>().is_ok())
        .unwrap_or(false)
}

/// Text between the first pair of double quotes in `text`.
fn quoted_name(text: &str) -> AccessResult<String> {
    let unterminated = || AccessError::CommandParse("Unterminated quoted area name".to_string());

    let start = text.find('"').ok_or_else(unterminated)? + 1;
    let len = text[start..].find('"').ok_or_else(unterminated)?;
    let name = &text[start..start + len];

    if name.trim().is_empty() {
        return Err(AccessError::CommandParse("Empty area name".to_string()));
    }
    Ok(name.to_string())
}

/// 1-indexed `N: "name" : (cx,cy)` lines, one per region.
pub fn region_listing(catalog: &RegionCatalog) -> String {
    if catalog.is_empty() {
        return "No restricted areas in this space.".to_string();
    }

    catalog
        .regions()
        .enumerate()
        .map(|(i, region)| {
            let center = region.center();
            format!("{}: \"{}\" : ({},{})", i + 1, region.name, center.x, center.y)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Region;
    use spacegate_types::{MapId, PlayerId, Rect};

    fn player(id: &str, name: &str, x: i64, y: i64) -> PlayerInfo {
        PlayerInfo::new(PlayerId::new(id), name, MapId::new("lobby"), Point::new(x, y))
    }

    fn catalog() -> RegionCatalog {
        RegionCatalog::from_regions(vec![
            Region::new(
                "vault",
                Rect::new(Point::new(10, 10), Point::new(20, 20)).unwrap(),
                "",
            ),
            Region::new(
                "Roof Top",
                Rect::new(Point::new(0, 0), Point::new(4, 8)).unwrap(),
                "",
            )
            .on_map(MapId::new("roof")),
        ])
        .unwrap()
    }

    #[test]
    fn test_parse_non_command() {
        assert_eq!(ModeratorCommand::parse("hello there").unwrap(), None);
        assert_eq!(ModeratorCommand::parse("").unwrap(), None);
        assert_eq!(ModeratorCommand::parse("/dance").unwrap(), None);
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            ModeratorCommand::parse("  /list ").unwrap(),
            Some(ModeratorCommand::List)
        );
    }

    #[test]
    fn test_parse_teleport_me() {
        let cmd = ModeratorCommand::parse("/teleport Alice me").unwrap().unwrap();
        assert_eq!(
            cmd,
            ModeratorCommand::Teleport {
                target: "Alice".into(),
                destination: Destination::Sender
            }
        );
    }

    #[test]
    fn test_parse_teleport_coordinates() {
        let cmd = ModeratorCommand::parse("/teleport Bob 0,0").unwrap().unwrap();
        assert_eq!(
            cmd,
            ModeratorCommand::Teleport {
                target: "Bob".into(),
                destination: Destination::Coordinates(Point::new(0, 0))
            }
        );

        let spaced = ModeratorCommand::parse("/teleport Bob 12, 7").unwrap().unwrap();
        assert!(matches!(
            spaced,
            ModeratorCommand::Teleport {
                destination: Destination::Coordinates(p),
                ..
            } if p == Point::new(12, 7)
        ));
    }

    #[test]
    fn test_parse_teleport_bad_coordinates() {
        let err = ModeratorCommand::parse("/teleport Bob 1,x").unwrap_err();
        assert!(matches!(err, AccessError::CommandParse(_)));
        assert!(ModeratorCommand::parse("/teleport Bob 1,").is_err());
    }

    #[test]
    fn test_parse_teleport_area_with_comma() {
        let cmd = ModeratorCommand::parse("/teleport Bob Hall,East").unwrap().unwrap();
        assert_eq!(
            cmd,
            ModeratorCommand::Teleport {
                target: "Bob".into(),
                destination: Destination::Area("Hall,East".into())
            }
        );

        let negative = ModeratorCommand::parse("/teleport Bob -4,9").unwrap().unwrap();
        assert!(matches!(
            negative,
            ModeratorCommand::Teleport {
                destination: Destination::Coordinates(p),
                ..
            } if p == Point::new(-4, 9)
        ));
    }

    #[test]
    fn test_parse_teleport_missing_arguments() {
        assert!(ModeratorCommand::parse("/teleport").is_err());
        assert!(ModeratorCommand::parse("/teleport Bob").is_err());
    }

    #[test]
    fn test_parse_teleport_quoted_area() {
        let cmd = ModeratorCommand::parse("/teleport Bob \"Roof Top\"")
            .unwrap()
            .unwrap();
        assert_eq!(
            cmd,
            ModeratorCommand::Teleport {
                target: "Bob".into(),
                destination: Destination::Area("Roof Top".into())
            }
        );
        assert!(ModeratorCommand::parse("/teleport Bob \"Roof Top").is_err());
    }

    #[test]
    fn test_execute_list() {
        let sender = player("p1", "Mod", 0, 0);
        let actions = ModeratorCommand::List
            .execute(&sender, &[], &catalog())
            .unwrap();

        assert_eq!(
            actions,
            vec![WorldAction::private_chat(
                PlayerId::new("p1"),
                MapId::new("lobby"),
                "1: \"vault\" : (15,15)\n2: \"Roof Top\" : (2,4)"
            )]
        );
    }

    #[test]
    fn test_execute_teleport_to_area_uses_region_map() {
        let sender = player("p1", "Mod", 0, 0);
        let players = vec![sender.clone(), player("p2", "Bob", 3, 3)];
        let cmd = ModeratorCommand::parse("/teleport Bob \"Roof Top\"")
            .unwrap()
            .unwrap();

        let actions = cmd.execute(&sender, &players, &catalog()).unwrap();
        assert_eq!(
            actions,
            vec![WorldAction::teleport(
                PlayerId::new("p2"),
                MapId::new("roof"),
                Point::new(2, 4)
            )]
        );
    }

    #[test]
    fn test_execute_unknown_target_and_area() {
        let sender = player("p1", "Mod", 0, 0);
        let players = vec![sender.clone()];

        let cmd = ModeratorCommand::parse("/teleport Ghost me").unwrap().unwrap();
        let err = cmd.execute(&sender, &players, &catalog()).unwrap_err();
        assert!(matches!(err, AccessError::UnknownTarget { kind: "player", .. }));

        let cmd = ModeratorCommand::parse("/teleport Mod attic").unwrap().unwrap();
        let err = cmd.execute(&sender, &players, &catalog()).unwrap_err();
        assert!(matches!(err, AccessError::UnknownTarget { kind: "area", .. }));
    }

    #[test]
    fn test_target_match_is_case_sensitive() {
        let sender = player("p1", "Mod", 0, 0);
        let players = vec![sender.clone(), player("p2", "bob", 3, 3)];
        let cmd = ModeratorCommand::parse("/teleport Bob me").unwrap().unwrap();
        assert!(cmd.execute(&sender, &players, &catalog()).is_err());
    }

    #[test]
    fn test_empty_listing() {
        assert_eq!(
            region_listing(&RegionCatalog::new()),
            "No restricted areas in this space."
        );
    }
}
