//! CLI command implementations.

pub mod admin;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod orders;

use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};

use pharma_commerce::orders::{OrderStatus, ReasonPreset};

/// Arguments for the cart command.
#[derive(Args)]
pub struct CartArgs {
    #[command(subcommand)]
    pub command: Option<CartCommand>,
}

#[derive(Subcommand)]
pub enum CartCommand {
    /// Show the cart with totals.
    Show,
    /// Add a medicine to the cart.
    Add {
        /// Medicine ID.
        product_id: String,
        /// Quantity to add.
        #[arg(short, long, default_value = "1", allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Set the quantity of a line.
    Set {
        /// Medicine ID.
        product_id: String,
        /// New quantity (values below one become one).
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line.
    Remove {
        /// Medicine ID.
        product_id: String,
    },
    /// Empty the cart.
    Clear {
        /// Skip confirmation.
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the checkout command.
#[derive(Args)]
pub struct CheckoutArgs {
    /// Skip confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the orders command.
#[derive(Args)]
pub struct OrdersArgs {
    #[command(subcommand)]
    pub command: Option<OrdersCommand>,
}

#[derive(Subcommand)]
pub enum OrdersCommand {
    /// List your orders.
    List,
    /// Show one order.
    Show {
        /// Order ID.
        id: String,
    },
    /// Ask for an order to be cancelled.
    Cancel {
        /// Order ID.
        id: String,
        /// Canned reason.
        #[arg(short, long, value_enum)]
        preset: Option<PresetArg>,
        /// Free text, appended to the preset.
        #[arg(short, long)]
        reason: Option<String>,
    },
}

/// Canned cancel reasons.
#[derive(Clone, Copy, ValueEnum)]
pub enum PresetArg {
    Mistake,
    Address,
    Late,
    Better,
    Other,
}

impl From<PresetArg> for ReasonPreset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Mistake => ReasonPreset::OrderedByMistake,
            PresetArg::Address => ReasonPreset::ChangeAddressOrPhone,
            PresetArg::Late => ReasonPreset::DeliveryTooLate,
            PresetArg::Better => ReasonPreset::FoundBetterOption,
            PresetArg::Other => ReasonPreset::Other,
        }
    }
}

/// Statuses an admin may force.
#[derive(Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Pending,
    Paid,
    Delivered,
}

impl From<StatusArg> for OrderStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Pending => OrderStatus::Pending,
            StatusArg::Paid => OrderStatus::Paid,
            StatusArg::Delivered => OrderStatus::Delivered,
        }
    }
}

/// Arguments for the admin command.
#[derive(Args)]
pub struct AdminArgs {
    #[command(subcommand)]
    pub command: AdminCommand,
}

#[derive(Subcommand)]
pub enum AdminCommand {
    /// Headline sales figures.
    Analytics,
    /// Best sellers.
    TopSelling {
        /// Number of rows.
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// List medicines with prices and stock.
    Inventory,
    /// List every order.
    Orders,
    /// List orders waiting on a cancel decision.
    CancelRequests,
    /// Approve a cancellation.
    Approve {
        /// Order ID.
        id: String,
    },
    /// Reject a cancellation.
    Reject {
        /// Order ID.
        id: String,
    },
    /// Force an order into a status.
    SetStatus {
        /// Order ID.
        id: String,
        #[arg(value_enum)]
        status: StatusArg,
    },
    /// List registered users.
    Users,
    /// Delete a user.
    DeleteUser {
        /// User ID.
        id: String,
        /// Skip confirmation.
        #[arg(short, long)]
        yes: bool,
    },
    /// Add a medicine to the catalog.
    AddMedicine {
        #[command(flatten)]
        fields: MedicineFields,
    },
    /// Change a medicine. Fields left out keep their current value.
    UpdateMedicine {
        /// Medicine ID.
        id: String,
        #[command(flatten)]
        fields: MedicineFields,
    },
    /// Revenue, cost and profit per medicine over paid and delivered orders.
    Profit {
        /// Also list medicines that have not sold.
        #[arg(short, long)]
        all: bool,
    },
    /// Delete a medicine from the catalog.
    DeleteMedicine {
        /// Medicine ID.
        id: String,
        /// Skip confirmation.
        #[arg(short, long)]
        yes: bool,
    },
}

/// Editable medicine fields. Amounts are in taka, dates are YYYY-MM-DD.
#[derive(Args, Default)]
pub struct MedicineFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    /// Selling price.
    #[arg(long)]
    pub price: Option<String>,
    /// What the pharmacy pays per unit.
    #[arg(long)]
    pub buy_price: Option<String>,
    #[arg(long)]
    pub stock: Option<u32>,
    #[arg(long)]
    pub expiry: Option<NaiveDate>,
    /// Percentage off, e.g. 12.5.
    #[arg(long, conflicts_with_all = ["flat_off", "no_discount"])]
    pub percent_off: Option<String>,
    /// Fixed amount off.
    #[arg(long, conflicts_with = "no_discount")]
    pub flat_off: Option<String>,
    /// First day of the discount.
    #[arg(long, conflicts_with = "no_discount")]
    pub discount_from: Option<NaiveDate>,
    /// Last day of the discount.
    #[arg(long, conflicts_with = "no_discount")]
    pub discount_until: Option<NaiveDate>,
    /// Switch the discount off.
    #[arg(long)]
    pub no_discount: bool,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}
