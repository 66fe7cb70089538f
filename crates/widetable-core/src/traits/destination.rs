use crate::traits::Record;

///
/// Target
///
/// A destination after every reference layer has been unwrapped (and
/// allocated): either one record decoded in place, or a sequence that
/// receives one record per row.
///

pub enum Target<'a, R> {
    One(&'a mut R),
    Many(&'a mut dyn Sequence<R>),
}

///
/// Sequence
///
/// Growable container of decoded records.
///

pub trait Sequence<R> {
    fn clear(&mut self);

    fn push_record(&mut self, record: R);
}

impl<E: Element> Sequence<E::Record> for Vec<E> {
    fn clear(&mut self) {
        Vec::clear(self);
    }

    fn push_record(&mut self, record: E::Record) {
        self.push(E::from_record(record));
    }
}

///
/// Element
///
/// Sequence element shapes: the record itself or a reference to it.
///

pub trait Element: Sized {
    type Record: Record;

    fn from_record(record: Self::Record) -> Self;
}

impl<E: Element> Element for Box<E> {
    type Record = E::Record;

    fn from_record(record: Self::Record) -> Self {
        Self::new(E::from_record(record))
    }
}

impl<E: Element> Element for Option<E> {
    type Record = E::Record;

    fn from_record(record: Self::Record) -> Self {
        Some(E::from_record(record))
    }
}

///
/// Destination
///
/// Anything a scan can decode into. Reference layers (`Option`, `Box`,
/// `&mut`) nest to any depth; resolving the target allocates every
/// unset layer on the way down.
///

pub trait Destination {
    type Record: Record;

    fn target(&mut self) -> Target<'_, Self::Record>;
}

impl<E: Element> Destination for Vec<E> {
    type Record = E::Record;

    fn target(&mut self) -> Target<'_, Self::Record> {
        Target::Many(self)
    }
}

impl<D: Destination + Default> Destination for Option<D> {
    type Record = D::Record;

    fn target(&mut self) -> Target<'_, Self::Record> {
        self.get_or_insert_with(D::default).target()
    }
}

impl<D: Destination + ?Sized> Destination for Box<D> {
    type Record = D::Record;

    fn target(&mut self) -> Target<'_, Self::Record> {
        (**self).target()
    }
}

impl<D: Destination + ?Sized> Destination for &mut D {
    type Record = D::Record;

    fn target(&mut self) -> Target<'_, Self::Record> {
        (**self).target()
    }
}
