use serde::{Deserialize, Serialize};

use crate::*;

const GRID_CARD_COUNTS_PAIRS: [usize; 4] = [8, 12, 16, 20];
const GRID_CARD_COUNTS_TRIPLES: [usize; 4] = [9, 12, 15, 18];
const GRID_CARD_COUNTS_QUADS: [usize; 4] = [8, 12, 16, 20];

/// Penalty applied to layouts whose orientation disagrees with the viewport.
const ORIENTATION_PENALTY: f64 = 1000.0;

/// One selectable board size for a group size.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridOption {
    pub id: String,
    pub cards: usize,
    pub rows: usize,
    pub cols: usize,
    pub label: String,
}

/// Fully resolved board configuration for one game session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOption {
    pub group_size: GroupSize,
    pub cards: usize,
    pub rows: usize,
    pub cols: usize,
    pub label: String,
}

impl MatchOption {
    pub const fn total_cards(&self) -> usize {
        self.rows * self.cols
    }

    /// Number of distinct symbol groups this board holds.
    pub fn unique_needed(&self) -> Result<usize> {
        let cards = self.total_cards();
        let group = self.group_size.get();
        if cards % group != 0 {
            return Err(GameError::UnevenGrid { cards, group });
        }
        Ok(cards / group)
    }
}

const fn card_counts(group: GroupSize) -> &'static [usize] {
    match group {
        GroupSize::Two => &GRID_CARD_COUNTS_PAIRS,
        GroupSize::Three => &GRID_CARD_COUNTS_TRIPLES,
        GroupSize::Four => &GRID_CARD_COUNTS_QUADS,
    }
}

const fn default_card_count(group: GroupSize) -> usize {
    match group {
        GroupSize::Two => 16,
        GroupSize::Three => 12,
        GroupSize::Four => 16,
    }
}

pub fn build_grid_options(group: GroupSize) -> Vec<GridOption> {
    card_counts(group)
        .iter()
        .map(|&cards| {
            let (rows, cols) = resolve_board_dimensions(cards, None);
            GridOption {
                id: cards.to_string(),
                cards,
                rows,
                cols,
                label: cards.to_string(),
            }
        })
        .collect()
}

pub fn default_grid_id_for_size(group: GroupSize) -> String {
    default_card_count(group).to_string()
}

pub fn find_grid_option(group: GroupSize, id: &str) -> Option<GridOption> {
    build_grid_options(group)
        .into_iter()
        .find(|option| option.id == id)
}

pub fn match_option(group: GroupSize, grid_id: &str) -> Result<MatchOption> {
    let grid =
        find_grid_option(group, grid_id).ok_or_else(|| GameError::UnknownGrid(grid_id.into()))?;
    Ok(MatchOption {
        group_size: group,
        cards: grid.cards,
        rows: grid.rows,
        cols: grid.cols,
        label: grid.label,
    })
}

/// Maps a stored or legacy grid id onto an id valid for `group`.
///
/// Accepts the canonical card count (`"16"`) and the older `ROWSxCOLS` form (`"4x4"`). Anything
/// else, including counts that are not offered for this group size, yields the default id.
pub fn normalize_grid_id_for_size(group: GroupSize, raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return default_grid_id_for_size(group);
    };

    if let Some(cards) = parse_grid_cards(raw) {
        if card_counts(group).contains(&cards) {
            return cards.to_string();
        }
    }

    log::warn!("Grid id {raw:?} not offered for group size {group}, using default");
    default_grid_id_for_size(group)
}

fn parse_grid_cards(raw: &str) -> Option<usize> {
    let trimmed = raw.trim();
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return trimmed.parse().ok().filter(|&cards| cards > 0);
    }

    let (rows, cols) = trimmed.split_once(['x', 'X'])?;
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(rows) || !all_digits(cols) {
        return None;
    }
    let rows: usize = rows.parse().ok()?;
    let cols: usize = cols.parse().ok()?;
    if rows == 0 || cols == 0 {
        return None;
    }
    rows.checked_mul(cols)
}

/// Picks `(rows, cols)` for `total_cards` so the board shape follows the viewport aspect ratio.
///
/// Without a viewport the most square layout wins. Wide viewports never get more rows than
/// columns and tall viewports never get more columns than rows.
pub fn resolve_board_dimensions(total_cards: usize, viewport: Option<(u32, u32)>) -> (usize, usize) {
    let viewport = viewport.filter(|&(width, height)| width > 0 && height > 0);
    let target_ratio = viewport.map_or(1.0, |(width, height)| width as f64 / height as f64);
    let prefer_wide = viewport.map(|(width, height)| width >= height);

    let mut best = (1, total_cards);
    let mut best_score = f64::INFINITY;
    let mut best_square_delta = usize::MAX;

    let mut rows = 1;
    while rows * rows <= total_cards {
        if total_cards % rows == 0 {
            let cols = total_cards / rows;
            for (cand_rows, cand_cols) in [(rows, cols), (cols, rows)] {
                let ratio = cand_cols as f64 / cand_rows as f64;
                let mut score = (ratio - target_ratio).abs();
                let square_delta = cand_cols.abs_diff(cand_rows);

                match prefer_wide {
                    Some(true) if cand_cols < cand_rows => score += ORIENTATION_PENALTY,
                    Some(false) if cand_rows < cand_cols => score += ORIENTATION_PENALTY,
                    _ => {}
                }

                if score < best_score || (score == best_score && square_delta < best_square_delta) {
                    best = (cand_rows, cand_cols);
                    best_score = score;
                    best_square_delta = square_delta;
                }
            }
        }
        rows += 1;
    }

    best
}

/// Short human readable form of a resolved board, e.g. `"4×4"`.
pub fn dimensions_label(option: &MatchOption) -> String {
    format!("{}×{}", option.rows, option.cols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_option_divides_by_group_size() {
        for group in GroupSize::ALL {
            let options = build_grid_options(group);
            assert!(!options.is_empty());
            for option in &options {
                assert_eq!(option.cards % group.get(), 0, "{group} / {}", option.id);
                assert_eq!(option.rows * option.cols, option.cards);
            }
        }
    }

    #[test]
    fn default_grid_is_offered() {
        for group in GroupSize::ALL {
            let default_id = default_grid_id_for_size(group);
            assert!(
                build_grid_options(group)
                    .iter()
                    .any(|option| option.id == default_id)
            );
        }
    }

    #[test]
    fn normalize_accepts_counts_and_legacy_tokens() {
        assert_eq!(normalize_grid_id_for_size(GroupSize::Two, Some("12")), "12");
        assert_eq!(normalize_grid_id_for_size(GroupSize::Two, Some(" 4x5 ")), "20");
        assert_eq!(normalize_grid_id_for_size(GroupSize::Three, Some("3X3")), "9");
    }

    #[test]
    fn normalize_falls_back_to_default() {
        assert_eq!(normalize_grid_id_for_size(GroupSize::Two, None), "16");
        assert_eq!(normalize_grid_id_for_size(GroupSize::Three, Some("16")), "12");
        assert_eq!(normalize_grid_id_for_size(GroupSize::Four, Some("0x4")), "16");
        assert_eq!(normalize_grid_id_for_size(GroupSize::Four, Some("big")), "16");
        assert_eq!(normalize_grid_id_for_size(GroupSize::Two, Some("")), "16");
    }

    #[test]
    fn square_layout_without_viewport() {
        assert_eq!(resolve_board_dimensions(16, None), (4, 4));
        assert_eq!(resolve_board_dimensions(12, None), (4, 3));
        assert_eq!(resolve_board_dimensions(20, None), (5, 4));
    }

    #[test]
    fn viewport_orientation_is_respected() {
        assert_eq!(resolve_board_dimensions(12, Some((1600, 900))), (3, 4));
        assert_eq!(resolve_board_dimensions(12, Some((900, 1600))), (4, 3));
        assert_eq!(resolve_board_dimensions(16, Some((1600, 900))), (4, 4));
        // zero-sized viewports are ignored
        assert_eq!(resolve_board_dimensions(12, Some((0, 900))), (4, 3));
    }

    #[test]
    fn match_option_rejects_unknown_grid() {
        assert_eq!(
            match_option(GroupSize::Three, "16"),
            Err(GameError::UnknownGrid("16".into()))
        );
        let option = match_option(GroupSize::Three, "12").unwrap();
        assert_eq!(option.unique_needed(), Ok(4));
        assert_eq!(dimensions_label(&option), "4×3");
    }

    #[test]
    fn uneven_board_is_fatal() {
        let option = MatchOption {
            group_size: GroupSize::Three,
            cards: 16,
            rows: 4,
            cols: 4,
            label: "16".into(),
        };
        assert_eq!(
            option.unique_needed(),
            Err(GameError::UnevenGrid { cards: 16, group: 3 })
        );
    }
}
