mod memo;
mod validation;

pub use memo::{parse_purchase_memo, MemoError, PurchaseMemo, PURCHASE_MEMO_TAG};
pub use validation::{
    assert_address,
    assert_issuance_id,
    assert_tx_hash,
    assert_uuid,
    assert_whole_amount,
    InputError,
};
