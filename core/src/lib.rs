#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Row Match engine.
//!
//! This crate defines the message surface that connects the authoritative
//! grid, the resolution systems and the collaborators living outside the
//! core. Systems submit [`Command`] values describing desired grid mutations,
//! the world executes those commands via its `apply` entry point and then
//! broadcasts [`Event`] values. Animation, item spawning, markers, hints and
//! effects are reached exclusively through the traits in [`services`].

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub mod barrier;
pub mod observers;
pub mod services;
pub mod snapshot;
pub mod view;

pub use barrier::JoinBarrier;
pub use observers::{EventBus, SubscriptionId};
pub use services::{
    Animator, EffectCue, Effects, HintPresenter, ItemSpawner, LevelProgress, MarkerPresenter,
    Services,
};
pub use snapshot::PositionSnapshot;
pub use view::{CellSnapshot, GridView, ItemSnapshot, RowView};

/// Commands that express all permissible grid mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Rebuilds the grid with the provided dimensions, discarding all items.
    ConfigureGrid {
        /// Number of columns in the grid, equal to the row capacity.
        columns: u32,
        /// Number of rows in the grid.
        rows: u32,
        /// Slots that are absent from the layout.
        holes: Vec<CellCoord>,
        /// Anchor position of the cell at column zero, row zero.
        origin: Vec2,
        /// Distance between neighbouring anchors along each axis.
        spacing: Vec2,
    },
    /// Creates a new item of the provided category inside an empty cell.
    PlaceItem {
        /// Cell that receives the item.
        cell: CellCoord,
        /// Category assigned to the item.
        category: Category,
    },
    /// Player-driven exchange of two items that honours interaction flags.
    ExchangeItems {
        /// First cell participating in the exchange.
        first: CellCoord,
        /// Second cell participating in the exchange.
        second: CellCoord,
    },
    /// Engine-driven swap of the occupancy of two cells, ignoring interaction flags.
    SwapItems {
        /// First cell participating in the swap.
        first: CellCoord,
        /// Second cell participating in the swap.
        second: CellCoord,
    },
    /// Enables or disables dragging and exchanging for a single item.
    SetItemInteraction {
        /// Item whose flags are updated.
        item: ItemId,
        /// Whether the player may drag and exchange the item.
        enabled: bool,
    },
    /// Starts or stops the idle animation of an item, pinning its scale when stopped.
    SetItemIdle {
        /// Item whose idle animation is toggled.
        item: ItemId,
        /// Whether the idle animation runs.
        idle: bool,
    },
    /// Flags every cell of a row as pending consolidation.
    SetRowPending {
        /// Row index whose cells are updated.
        row: u32,
        /// Whether the row is pending consolidation.
        pending: bool,
    },
    /// Flags every cell of a row as consolidated.
    SetRowConsolidated {
        /// Row index whose cells are updated.
        row: u32,
        /// Whether the row holds a consolidated result.
        consolidated: bool,
    },
    /// Overwrites the anchor transform of a cell.
    SetCellTransform {
        /// Cell whose anchor is updated.
        cell: CellCoord,
        /// Anchor transform applied to the cell.
        transform: Transform,
    },
    /// Recolors the background of a cell using a palette entry.
    SetCellTint {
        /// Cell whose background is recolored.
        cell: CellCoord,
        /// Palette entry applied, or `None` to restore the default background.
        tint: Option<PaletteIndex>,
    },
    /// Toggles the stacked visual of every cell in a row.
    SetRowStacked {
        /// Row index whose cells are updated.
        row: u32,
        /// Whether the row shows its stacked visual.
        stacked: bool,
    },
    /// Destroys the item inside a cell and clears its occupancy and flags.
    ClearCell {
        /// Cell that is cleared.
        cell: CellCoord,
    },
}

/// Events broadcast by the world and the engine after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that the grid was rebuilt.
    GridConfigured {
        /// Number of columns in the grid.
        columns: u32,
        /// Number of rows in the grid.
        rows: u32,
    },
    /// Confirms that an item was created inside a cell.
    ItemPlaced {
        /// Cell that holds the new item.
        cell: CellCoord,
        /// Identifier allocated to the item by the world.
        item: ItemId,
        /// Category assigned to the item.
        category: Category,
    },
    /// Confirms that the player exchanged two items.
    ItemsExchanged {
        /// First cell participating in the exchange.
        first: CellCoord,
        /// Second cell participating in the exchange.
        second: CellCoord,
    },
    /// Reports that a player exchange was refused.
    ExchangeRejected {
        /// First cell provided in the request.
        first: CellCoord,
        /// Second cell provided in the request.
        second: CellCoord,
        /// Specific reason the exchange failed.
        reason: ExchangeError,
    },
    /// Confirms that the occupancy of two cells was swapped by the engine.
    ItemsSwapped {
        /// First cell participating in the swap.
        first: CellCoord,
        /// Second cell participating in the swap.
        second: CellCoord,
    },
    /// Reports that a command referenced a cell outside the layout.
    CellMissing {
        /// Coordinate that did not resolve to a cell.
        cell: CellCoord,
    },
    /// Confirms that the interaction flags of an item changed.
    InteractionChanged {
        /// Item whose flags changed.
        item: ItemId,
        /// Whether the item can be dragged and exchanged.
        enabled: bool,
    },
    /// Confirms that the pending flag of a row changed.
    RowPendingChanged {
        /// Row index whose cells changed.
        row: u32,
        /// Whether the row is pending consolidation.
        pending: bool,
    },
    /// Confirms that the consolidated flag of a row changed.
    RowConsolidationChanged {
        /// Row index whose cells changed.
        row: u32,
        /// Whether the row holds a consolidated result.
        consolidated: bool,
    },
    /// Confirms that a cell was cleared.
    CellCleared {
        /// Cell that was cleared.
        cell: CellCoord,
        /// Item destroyed by the clear, if any.
        item: Option<ItemId>,
    },
    /// Announces that a uniform row was detected and queued.
    RowMatched {
        /// Row index of the match.
        row: u32,
        /// Category shared by every item of the row.
        category: Category,
    },
    /// Announces that a queued row began consolidating.
    ConsolidationStarted {
        /// Row that matched.
        source: u32,
        /// Row selected to receive the matched items.
        target: u32,
    },
    /// Announces that a matched row was moved into its target row.
    RowPaired {
        /// Row that matched.
        source: u32,
        /// Row that now holds the consolidated result.
        target: u32,
        /// Category shared by the consolidated items.
        category: Category,
    },
    /// Announces that a collection marker was shown for a row.
    MarkerCreated {
        /// Identifier returned by the marker presenter.
        marker: MarkerId,
        /// Row the marker is anchored to.
        row: u32,
        /// Palette entry used by the marker.
        palette: PaletteIndex,
        /// Category displayed by the marker.
        category: Category,
    },
    /// Announces that a consolidated row finished collapsing.
    RowCollapsed {
        /// Row index that collapsed.
        row: u32,
    },
    /// Announces that a consolidated row is being regenerated.
    SupplementStarted {
        /// Row index being regenerated.
        row: u32,
        /// Regenerations left after this one.
        remaining_budget: u32,
    },
    /// Announces that a row received fresh items.
    RowRegenerated {
        /// Row index that was regenerated.
        row: u32,
    },
    /// Announces that a hint presented the category.
    HintShown {
        /// Category surfaced by the hint.
        category: Category,
    },
    /// Announces that an active hint for the category ended.
    HintEnded {
        /// Category whose hint ended.
        category: Category,
    },
    /// Announces that the level-progress collaborator reported victory.
    VictoryDeclared,
}

/// Reasons a player exchange may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExchangeError {
    /// Both coordinates reference the same cell.
    SameCell,
    /// One of the coordinates lies outside the layout.
    OutOfBounds,
    /// One of the cells holds no item.
    EmptyCell,
    /// One of the items is committed to a resolution and cannot move.
    Locked,
}

/// Tag that must match across a full row for it to resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Category(u16);

impl Category {
    /// Creates a new category tag with the provided numeric value.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the category.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Unique identifier assigned to an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(u32);

impl ItemId {
    /// Creates a new item identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier handed out by the marker presenter for a collection marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarkerId(u32);

impl MarkerId {
    /// Creates a new marker identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Completion handle returned by the animation service for a tween.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TweenToken(u64);

impl TweenToken {
    /// Creates a new tween token with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the token.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// Index into the finite palette of marker variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PaletteIndex(u32);

impl PaletteIndex {
    /// Creates a new palette index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Color attached to a palette entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaletteColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl PaletteColor {
    /// Creates a new palette color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Anchor position and scale of a cell or item.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Position of the anchor in layout units.
    pub position: Vec2,
    /// Scale applied to the anchor.
    pub scale: Vec2,
}

impl Transform {
    /// Creates a transform at the provided position with unit scale.
    #[must_use]
    pub const fn at(position: Vec2) -> Self {
        Self {
            position,
            scale: Vec2::ONE,
        }
    }

    /// Returns a copy of the transform moved to the provided position.
    #[must_use]
    pub const fn with_position(self, position: Vec2) -> Self {
        Self {
            position,
            scale: self.scale,
        }
    }

    /// Returns a copy of the transform with the provided uniform scale.
    #[must_use]
    pub fn with_uniform_scale(self, scale: f32) -> Self {
        Self {
            position: self.position,
            scale: Vec2::splat(scale),
        }
    }
}

/// Easing curves the animation service is asked to apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Easing {
    /// Constant velocity.
    Linear,
    /// Decelerating quadratic curve.
    OutQuad,
    /// Decelerating curve that overshoots before settling.
    OutBack,
    /// Curve that bounces against the end value.
    OutBounce,
    /// Symmetric sinusoidal ease in and out.
    InOutSine,
}

/// Object animated by a tween.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TweenSubject {
    /// Anchor of a grid cell.
    Cell(CellCoord),
    /// Item sitting inside a cell.
    Item(ItemId),
    /// Collection marker shown for a consolidated row.
    Marker(MarkerId),
}

/// Request submitted to the animation service.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TweenRequest {
    /// Object being animated.
    pub subject: TweenSubject,
    /// Transform at the start of the tween.
    pub from: Transform,
    /// Transform at the end of the tween.
    pub to: Transform,
    /// Length of the tween.
    pub duration: Duration,
    /// Curve applied while interpolating.
    pub easing: Easing,
}

/// Uniform row awaiting consolidation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MatchedRow {
    row: u32,
    category: Category,
    cells: Vec<CellCoord>,
}

impl MatchedRow {
    /// Creates a matched row, ordering the cells by column.
    #[must_use]
    pub fn new(row: u32, category: Category, mut cells: Vec<CellCoord>) -> Self {
        cells.sort_by_key(|cell| cell.column());
        Self {
            row,
            category,
            cells,
        }
    }

    /// Row index that matched.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Category shared by every item of the row.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// Cells of the row ordered by column.
    #[must_use]
    pub fn cells(&self) -> &[CellCoord] {
        &self.cells
    }

    /// Returns the same match relocated to another row index.
    #[must_use]
    pub fn relocated(&self, row: u32) -> Self {
        let cells = self
            .cells
            .iter()
            .map(|cell| CellCoord::new(cell.column(), row))
            .collect();
        Self {
            row,
            category: self.category,
            cells,
        }
    }
}

/// Outcome of advancing a multi-step operation by one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Progress {
    /// The operation is suspended until a later frame.
    Pending,
    /// The operation finished.
    Done,
}
