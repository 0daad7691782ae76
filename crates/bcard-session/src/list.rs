//! [`CardList`]: a local collection of cards backing a listing view.

use bcard_core::{Error, Result, card::Card, directory::Directory};

use crate::reconciler::{FavoriteReconciler, ToggleOutcome};

/// Which cards a list keeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListFilter {
  /// Every card (the home listing).
  All,
  /// Only cards liked by this subject (the favorites listing).
  LikedBy(String),
}

#[derive(Debug, Clone)]
pub struct CardList {
  filter: ListFilter,
  cards:  Vec<Card>,
}

impl CardList {
  pub fn all(cards: Vec<Card>) -> Self {
    Self {
      filter: ListFilter::All,
      cards,
    }
  }

  /// The favorites of `subject_id` among `cards`.
  pub fn favorites_of(
    subject_id: impl Into<String>,
    cards: impl IntoIterator<Item = Card>,
  ) -> Self {
    let subject_id = subject_id.into();
    let cards = cards
      .into_iter()
      .filter(|c| c.is_liked_by(&subject_id))
      .collect();
    Self {
      filter: ListFilter::LikedBy(subject_id),
      cards,
    }
  }

  pub fn filter(&self) -> &ListFilter { &self.filter }

  pub fn cards(&self) -> &[Card] { &self.cards }

  pub fn len(&self) -> usize { self.cards.len() }

  pub fn is_empty(&self) -> bool { self.cards.is_empty() }

  pub fn get(&self, card_id: &str) -> Option<&Card> {
    self.cards.iter().find(|c| c.id == card_id)
  }

  /// Toggle the current user's like on one card of the list.
  ///
  /// The card is replaced by the server's copy; a favorites list drops it as
  /// soon as the un-like is confirmed, without refetching.
  pub async fn toggle_like<D: Directory>(
    &mut self,
    reconciler: &FavoriteReconciler<D>,
    card_id: &str,
  ) -> Result<ToggleOutcome> {
    let card = self
      .cards
      .iter_mut()
      .find(|c| c.id == card_id)
      .ok_or_else(|| Error::CardNotFound(card_id.to_owned()))?;

    let outcome = reconciler.toggle_like(card).await?;

    if let ListFilter::LikedBy(subject_id) = &self.filter {
      self.cards.retain(|c| c.is_liked_by(subject_id));
    }
    Ok(outcome)
  }
}
