/// Single-line text entries.
pub const TEXT_INPUTS: &str =
    "input[type='text'], input[type='number'], input[type='email'], input[type='tel']";

pub const CHECKBOXES: &str = "input[type='checkbox']";

/// Radio group containers. The group, not the button, is one field.
pub const RADIO_GROUPS: &str = "fieldset, div[role='radiogroup']";

/// Selectable choices inside a radio group: native buttons and the styled
/// label variant.
pub const RADIO_OPTIONS: &str = "input[type='radio'], label[data-test-text-selectable-option__label]";

pub const LEGEND: &str = "legend";

pub const NATIVE_SELECTS: &str = "select";

/// Dropdown triggers not backed by a native `<select>`.
pub const CUSTOM_DROPDOWNS: &str = "button.artdeco-dropdown__trigger, div[role='combobox']";

/// Options of an opened custom dropdown.
pub const DROPDOWN_OPTIONS: &str =
    "div[role='option'], li[role='option'], div.basic-typeahead__option";

/// Search box inside or next to a typeahead dropdown.
pub const DROPDOWN_SEARCH: &str = "input[type='search'], input[type='text']";

/// Typeahead search box rendered outside its trigger.
pub const PAGE_SEARCH: &str = "input[type='search']";

/// Overlays that block clicks on the listing.
pub const OVERLAY_CLOSE: &str =
    "button[aria-label='Dismiss'], button[data-test-modal-close-btn], button.artdeco-modal__dismiss";

/// Close button of the post-submission confirmation.
pub const CONFIRMATION_DISMISS: &str = "button[aria-label='Dismiss']";

pub const JOB_CARDS: &str = ".job-card-container--clickable";

pub const APPLY_BUTTON: &str = ".jobs-apply-button";

/// Container text that marks a select as the phone country code picker.
pub const COUNTRY_CODE_MARKER: &str = "phone country code";
